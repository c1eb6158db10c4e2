//! Validation, splitting and encoding of object detection datasets.
//!
//! A dataset is a directory of images and a sibling directory of Pascal VOC
//! style annotation files. The pipeline removes annotation files that do not
//! agree with their images, partitions the rest into training and evaluation
//! sets, and encodes both sets into record files along with a label map.

mod common;

pub mod annotation;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod record;
pub mod split;
pub mod table;
pub mod utils;
pub mod validate;

pub use annotation::{Annotation, Field, ObjectLabel, ParseError, ParseErrors};
pub use error::{PipelineError, Result};
pub use layout::DatasetLayout;
pub use pipeline::{EncodeConfig, EncodedDataset, SplitDataset, ValidatedDataset};
pub use record::{read_records, write_records, TrainingExample};
pub use split::{split_files, split_into_dirs, DatasetSplit, SplitConfig};
pub use table::{ImageGroup, LabelRow, LabelTable};
pub use utils::{check_empty_dir, list_files, prepare_empty_dir};
pub use validate::{
    validate_annotation, validate_dataset, CheckedImage, UndeletedFile, ValidationError,
    ValidationIssue, ValidationOutcome, ValidationReport,
};

pub use label::LabelSchema;
