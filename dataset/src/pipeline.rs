//! Stage-by-stage dataset preparation.
//!
//! Each stage borrows the output of the previous one and returns the input of
//! the next one: [validate](ValidatedDataset::validate) →
//! [split](ValidatedDataset::split) → [encode](SplitDataset::encode).
//! Every stage is blocking and runs file by file on the calling thread.

use crate::{
    common::*,
    layout::{DatasetLayout, ANNOTATION_EXTENSION},
    record::write_records,
    split::{split_into_dirs, SplitConfig, EVAL_DIR_NAME, TRAIN_DIR_NAME},
    table::LabelTable,
    validate::{validate_dataset, ValidationReport},
};

pub const TRAIN_CSV_FILE: &str = "train_labels.csv";
pub const EVAL_CSV_FILE: &str = "eval_labels.csv";
pub const TRAIN_RECORD_FILE: &str = "train_labels.record";
pub const EVAL_RECORD_FILE: &str = "eval_labels.record";
pub const LABEL_MAP_FILE: &str = "label_map.pbtxt";

/// Options of the encode stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Classes to keep. All classes are kept if unset.
    pub class_whitelist: Option<HashSet<String>>,
}

/// A dataset whose annotation files all passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedDataset {
    pub layout: DatasetLayout,
    /// Surviving annotation files, sorted by path.
    pub annotation_files: Vec<PathBuf>,
    pub report: ValidationReport,
}

impl ValidatedDataset {
    /// Validates the dataset in place. Invalid annotation files are deleted.
    pub fn validate(layout: DatasetLayout) -> Result<Self> {
        let report = validate_dataset(&layout)?;
        Ok(Self {
            annotation_files: report.valid_files.clone(),
            layout,
            report,
        })
    }

    /// Takes an already validated dataset as is.
    pub fn from_existing(layout: DatasetLayout) -> Result<Self> {
        let annotation_files = layout.annotation_files()?;
        let report = ValidationReport {
            valid_files: annotation_files.clone(),
            ..Default::default()
        };
        Ok(Self {
            layout,
            annotation_files,
            report,
        })
    }

    /// Copies the annotation files into training and evaluation directories below `split_dir`.
    pub fn split(&self, split_dir: impl AsRef<Path>, config: &SplitConfig) -> Result<SplitDataset> {
        let split_dir = split_dir.as_ref();
        let (split, train_dir, eval_dir) = split_into_dirs(&self.annotation_files, split_dir, config)?;

        Ok(SplitDataset {
            layout: self.layout.clone(),
            split_dir: split_dir.to_owned(),
            train_dir,
            eval_dir,
            train_files: split.train,
            eval_files: split.eval,
        })
    }
}

/// Annotation files partitioned into two directories.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub layout: DatasetLayout,
    pub split_dir: PathBuf,
    pub train_dir: PathBuf,
    pub eval_dir: PathBuf,
    pub train_files: Vec<PathBuf>,
    pub eval_files: Vec<PathBuf>,
}

impl SplitDataset {
    /// Reopens the output of an earlier split.
    pub fn from_existing(layout: DatasetLayout, split_dir: impl AsRef<Path>) -> Result<Self> {
        let split_dir = split_dir.as_ref();
        let train_dir = split_dir.join(TRAIN_DIR_NAME);
        let eval_dir = split_dir.join(EVAL_DIR_NAME);

        for dir in [&train_dir, &eval_dir] {
            if !dir.is_dir() {
                return Err(PipelineError::InvalidConfig(format!(
                    "'{}' is not a split dataset directory",
                    split_dir.display()
                )));
            }
        }

        Ok(Self {
            layout,
            split_dir: split_dir.to_owned(),
            train_files: crate::list_files(&train_dir, ANNOTATION_EXTENSION)?,
            eval_files: crate::list_files(&eval_dir, ANNOTATION_EXTENSION)?,
            train_dir,
            eval_dir,
        })
    }

    /// Writes label tables, the label map and record files into `encoded_dir`.
    ///
    /// `encoded_dir` must be empty or absent. On a failure while writing a
    /// record file, that file is removed and the error is returned.
    pub fn encode(&self, encoded_dir: impl AsRef<Path>, config: &EncodeConfig) -> Result<EncodedDataset> {
        let encoded_dir = encoded_dir.as_ref();
        crate::prepare_empty_dir(encoded_dir)?;

        let whitelist = config.class_whitelist.as_ref();
        let extension = &self.layout.image_extension;
        let (train_table, train_classes) =
            LabelTable::from_annotation_dir(&self.train_dir, whitelist, extension)?;
        let (eval_table, eval_classes) =
            LabelTable::from_annotation_dir(&self.eval_dir, whitelist, extension)?;

        let train_csv = encoded_dir.join(TRAIN_CSV_FILE);
        let eval_csv = encoded_dir.join(EVAL_CSV_FILE);
        info!("converting train labels to csv");
        train_table.write_csv(&train_csv)?;
        info!("converting eval labels to csv");
        eval_table.write_csv(&eval_csv)?;

        info!("creating label map file");
        let schema = LabelSchema::from_names(train_classes.into_iter().chain(eval_classes));
        info!("classes found: [{}]", schema.classes().iter().join(", "));
        let label_map = encoded_dir.join(LABEL_MAP_FILE);
        schema.save(&label_map).map_err(PipelineError::io(&label_map))?;

        let images_dir = self.layout.images_dir();
        let train_record = encoded_dir.join(TRAIN_RECORD_FILE);
        let eval_record = encoded_dir.join(EVAL_RECORD_FILE);
        info!("creating train record file");
        let num_train = write_records(&train_table, &images_dir, &schema, extension, &train_record)?;
        info!("creating eval record file");
        let num_eval = write_records(&eval_table, &images_dir, &schema, extension, &eval_record)?;

        Ok(EncodedDataset {
            encoded_dir: encoded_dir.to_owned(),
            train_csv,
            eval_csv,
            label_map,
            train_record,
            eval_record,
            num_train,
            num_eval,
            schema,
        })
    }
}

/// The files produced by the encode stage.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    pub encoded_dir: PathBuf,
    pub train_csv: PathBuf,
    pub eval_csv: PathBuf,
    pub label_map: PathBuf,
    pub train_record: PathBuf,
    pub eval_record: PathBuf,
    /// The number of training examples written.
    pub num_train: usize,
    /// The number of evaluation examples written.
    pub num_eval: usize,
    pub schema: LabelSchema,
}
