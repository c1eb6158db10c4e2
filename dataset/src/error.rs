//! Error types of the dataset pipeline.

use crate::annotation::ParseErrors;
use std::{io, path::PathBuf};

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Errors that stop a pipeline stage.
///
/// Defects of individual annotation files found during validation are not
/// reported here. They are collected in [ValidationReport](crate::ValidationReport).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to parse annotation file '{}': {errors}", path.display())]
    Parse { path: PathBuf, errors: ParseErrors },
    #[error("the directory '{}' is not empty", path.display())]
    DirectoryNotEmpty { path: PathBuf },
    #[error("class '{label}' of image '{filename}' is not in the label schema")]
    UnknownLabel { label: String, filename: String },
    #[error("failed to read image '{}': {reason}", path.display())]
    ImageRead { path: PathBuf, reason: String },
    #[error("malformed training example: {0}")]
    MalformedExample(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to process table '{}'", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to process record file '{}'", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: tfrecord::Error,
    },
    #[error("invalid file pattern")]
    Pattern(#[from] glob::PatternError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>) -> impl FnOnce(csv::Error) -> Self {
        let path = path.into();
        move |source| Self::Csv { path, source }
    }

    pub(crate) fn record(path: impl Into<PathBuf>) -> impl FnOnce(tfrecord::Error) -> Self {
        let path = path.into();
        move |source| Self::Record { path, source }
    }
}
