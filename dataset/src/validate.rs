//! Consistency checks between annotation files and the images they describe.

use crate::{
    annotation::{Annotation, ParseError},
    common::*,
    layout::DatasetLayout,
    utils::file_name_of,
};
use image::GenericImageView;

/// A single defect of an annotation file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error(transparent)]
    Parse(ParseError),
    #[error("cannot load image '{}': {reason}", path.display())]
    ImageUnreadable { path: PathBuf, reason: String },
    #[error("width {declared} != {actual}")]
    WidthMismatch { declared: u32, actual: u32 },
    #[error("height {declared} != {actual}")]
    HeightMismatch { declared: u32, actual: u32 },
    #[error("object {object}, {coord} value {value} is out of range [0, {bound}]")]
    CoordinateOutOfRange {
        object: usize,
        coord: Coord,
        value: i64,
        bound: u32,
    },
}

/// All defects found in one annotation file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} error(s) in file '{}'", issues.len(), annotation_file.display())]
pub struct ValidationError {
    pub annotation_file: PathBuf,
    pub issues: Vec<ValidationIssue>,
}

/// The image an annotation was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedImage {
    pub path: PathBuf,
    pub size: ImageSize,
}

/// The verdict on one annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid {
        annotation_file: PathBuf,
        annotation: Annotation,
        image: CheckedImage,
    },
    Invalid(ValidationError),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn annotation_file(&self) -> &Path {
        match self {
            Self::Valid {
                annotation_file, ..
            } => annotation_file,
            Self::Invalid(error) => &error.annotation_file,
        }
    }
}

/// Checks one annotation file without modifying anything on disk.
pub fn validate_annotation(annotation_file: impl AsRef<Path>, layout: &DatasetLayout) -> ValidationOutcome {
    let annotation_file = annotation_file.as_ref().to_owned();
    let invalid = |annotation_file, issues| {
        ValidationOutcome::Invalid(ValidationError {
            annotation_file,
            issues,
        })
    };

    let annotation = match Annotation::open(&annotation_file) {
        Ok(annotation) => annotation,
        Err(errors) => {
            let issues = errors.into_iter().map(ValidationIssue::Parse).collect();
            return invalid(annotation_file, issues);
        }
    };

    let image_path = layout.image_path(&annotation.filename);
    let actual = match decode_image_size(&image_path) {
        Ok(size) => size,
        Err(reason) => {
            let issue = ValidationIssue::ImageUnreadable {
                path: image_path,
                reason,
            };
            return invalid(annotation_file, vec![issue]);
        }
    };

    let mut issues = vec![];

    if annotation.size.width != actual.width {
        issues.push(ValidationIssue::WidthMismatch {
            declared: annotation.size.width,
            actual: actual.width,
        });
    }
    if annotation.size.height != actual.height {
        issues.push(ValidationIssue::HeightMismatch {
            declared: annotation.size.height,
            actual: actual.height,
        });
    }

    // ranges are checked against the decoded size, not the declared one
    for (object, label) in annotation.objects.iter().enumerate() {
        for coord in label.bndbox.out_of_range(&actual) {
            issues.push(ValidationIssue::CoordinateOutOfRange {
                object,
                coord,
                value: label.bndbox.get(coord),
                bound: coord.upper_bound(&actual),
            });
        }
    }

    if issues.is_empty() {
        ValidationOutcome::Valid {
            annotation_file,
            annotation,
            image: CheckedImage {
                path: image_path,
                size: actual,
            },
        }
    } else {
        invalid(annotation_file, issues)
    }
}

/// Fully decodes an image and returns its size.
///
/// The format is detected from the file content, not from the extension.
fn decode_image_size(path: &Path) -> Result<ImageSize, String> {
    let image = image::io::Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| err.to_string())?
        .decode()
        .map_err(|err| err.to_string())?;
    let (width, height) = image.dimensions();
    Ok(ImageSize::new(width, height))
}

/// An invalid annotation file that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unable to delete '{}': {reason}", path.display())]
pub struct UndeletedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The summary of a validation pass over a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Annotation files that passed, sorted by path.
    pub valid_files: Vec<PathBuf>,
    /// Annotation files that failed along with their defects.
    pub errors: Vec<ValidationError>,
    /// Failed files that are still on disk because removal failed.
    pub undeleted: Vec<UndeletedFile>,
}

impl ValidationReport {
    pub fn num_checked(&self) -> usize {
        self.num_valid() + self.num_invalid()
    }

    pub fn num_valid(&self) -> usize {
        self.valid_files.len()
    }

    pub fn num_invalid(&self) -> usize {
        self.errors.len()
    }

    /// Failed files that were removed.
    pub fn deleted_files(&self) -> impl Iterator<Item = &Path> {
        self.errors
            .iter()
            .map(|error| error.annotation_file.as_path())
            .filter(move |path| !self.undeleted.iter().any(|file| file.path == *path))
    }

    /// Removes every failed file. A failed removal is recorded and does not
    /// stop the remaining ones.
    fn delete_invalid_files(&mut self) {
        let undeleted: Vec<_> = self
            .errors
            .iter()
            .filter_map(|error| {
                let path = &error.annotation_file;
                warn!("deleting '{}'", path.display());
                let err = fs::remove_file(path).err()?;
                let file = UndeletedFile {
                    path: path.clone(),
                    reason: err.to_string(),
                };
                error!("{}", file);
                Some(file)
            })
            .collect();
        self.undeleted = undeleted;
    }
}

/// Validates every annotation file of the dataset and deletes the invalid ones.
///
/// A defective file never stops the pass, and neither does a file that cannot
/// be removed; those are listed in [ValidationReport::undeleted]. The returned
/// error is reserved for an unreadable annotation directory.
pub fn validate_dataset(layout: &DatasetLayout) -> Result<ValidationReport> {
    info!(
        "validating annotations in '{}'",
        layout.annotations_dir().display()
    );

    let mut report = ValidationReport::default();

    for annotation_file in layout.annotation_files()? {
        match validate_annotation(&annotation_file, layout) {
            ValidationOutcome::Valid { .. } => {
                debug!("'{}' is valid", annotation_file.display());
                report.valid_files.push(annotation_file);
            }
            ValidationOutcome::Invalid(error) => {
                let name = file_name_of(&error.annotation_file);
                for issue in &error.issues {
                    error!("error in file {}, {}", name, issue);
                }
                error!("error(s) in file {}", name);
                report.errors.push(error);
            }
        }
    }

    info!(
        "checked {} files, {} ok, found {} errors",
        report.num_checked(),
        report.num_valid(),
        report.num_invalid()
    );

    report.delete_invalid_files();
    Ok(report)
}
