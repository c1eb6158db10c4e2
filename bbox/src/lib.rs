//! Safe bounding box and image size types.

mod common;

pub use bndbox::*;
pub mod bndbox;

pub use size::*;
pub mod size;
