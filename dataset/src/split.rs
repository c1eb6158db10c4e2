//! Reproducible train/eval partition of annotation files.

use crate::{common::*, utils::file_name_of};

pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;
pub const DEFAULT_SEED: u64 = 42;
pub const TRAIN_DIR_NAME: &str = "training";
pub const EVAL_DIR_NAME: &str = "evaluating";

/// Split options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// The fraction of files assigned to the training set, in `(0, 1]`.
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    /// The seed of the shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
            seed: DEFAULT_SEED,
        }
    }
}

impl SplitConfig {
    pub fn check(&self) -> Result<()> {
        let fraction = self.train_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "train_fraction must be in (0, 1], but get {}",
                fraction
            )));
        }
        Ok(())
    }

    /// The number of training files out of `num_files`.
    pub fn num_train(&self, num_files: usize) -> usize {
        let num_train = (self.train_fraction * num_files as f64).round() as usize;
        num_train.min(num_files)
    }
}

fn default_train_fraction() -> f64 {
    DEFAULT_TRAIN_FRACTION
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// A partition of files into two disjoint sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSplit {
    pub train: Vec<PathBuf>,
    pub eval: Vec<PathBuf>,
}

impl DatasetSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.eval.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shuffles the files with a seeded generator and cuts the sequence in two.
///
/// The input is sorted first, so the result depends on the set of files and
/// the config only. No stratification by class is performed.
pub fn split_files(files: &[PathBuf], config: &SplitConfig) -> Result<DatasetSplit> {
    config.check()?;

    let mut files: Vec<_> = files.iter().cloned().sorted().dedup().collect();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    files.shuffle(&mut rng);

    let num_train = config.num_train(files.len());
    let eval = files.split_off(num_train);

    Ok(DatasetSplit { train: files, eval })
}

/// Partitions the files and copies each one into `<split_dir>/training` or
/// `<split_dir>/evaluating`.
///
/// `split_dir` must be empty or absent. Both destination directories are
/// checked before the first copy, and source files are left in place.
pub fn split_into_dirs(
    files: &[PathBuf],
    split_dir: impl AsRef<Path>,
    config: &SplitConfig,
) -> Result<(DatasetSplit, PathBuf, PathBuf)> {
    let split_dir = split_dir.as_ref();
    let split = split_files(files, config)?;

    crate::prepare_empty_dir(split_dir)?;
    let train_dir = split_dir.join(TRAIN_DIR_NAME);
    let eval_dir = split_dir.join(EVAL_DIR_NAME);
    crate::prepare_empty_dir(&train_dir)?;
    crate::prepare_empty_dir(&eval_dir)?;

    info!("train size: {}", split.train.len());
    info!("eval size: {}", split.eval.len());

    let copy_all = |files: &[PathBuf], dir: &Path| -> Result<Vec<PathBuf>> {
        info!("copying {} files to '{}'", files.len(), dir.display());
        files
            .iter()
            .map(|src| {
                let dst = dir.join(file_name_of(src));
                fs::copy(src, &dst).map_err(PipelineError::io(src))?;
                Ok(dst)
            })
            .collect()
    };

    let train = copy_all(&split.train, &train_dir)?;
    let eval = copy_all(&split.eval, &eval_dir)?;

    Ok((DatasetSplit { train, eval }, train_dir, eval_dir))
}
