//! Common imports from external crates.

pub use anyhow::{Context, Result};
pub use itertools::Itertools;
pub use label::LabelSchema;
pub use log::{info, warn};
pub use prettytable::{cell, row, Table};
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};
pub use tfod_dataset::{
    DatasetLayout, EncodeConfig, EncodedDataset, SplitConfig, SplitDataset, TrainingExample,
    ValidatedDataset, ValidationReport,
};
