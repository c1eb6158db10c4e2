pub use anyhow::{ensure, Result};
pub use std::fmt;
