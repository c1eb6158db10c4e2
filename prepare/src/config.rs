//! Dataset preparation configuration format.

use crate::common::*;

/// The main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub split: SplitStageConfig,
    pub encode: EncodeStageConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        Self::from_json5_str(&text)
    }

    pub fn from_json5_str(text: &str) -> Result<Self> {
        let config: Self = json5::from_str(text)?;
        config.split.options().check()?;
        Ok(config)
    }
}

/// Location of the raw dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// The directory containing the images and annotations directories.
    pub dir: PathBuf,
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    #[serde(default = "default_annotations_dir")]
    pub annotations_dir: String,
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
}

impl DatasetConfig {
    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout {
            dataset_dir: self.dir.clone(),
            images_dir_name: self.images_dir.clone(),
            annotations_dir_name: self.annotations_dir.clone(),
            image_extension: self.image_extension.clone(),
        }
    }
}

/// Split stage options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitStageConfig {
    /// The output directory. It must be empty or absent.
    pub dir: PathBuf,
    /// Fraction of files assigned to the training set, in (0, 1].
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl SplitStageConfig {
    pub fn options(&self) -> SplitConfig {
        SplitConfig {
            train_fraction: self.train_fraction,
            seed: self.seed,
        }
    }
}

/// Encode stage options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeStageConfig {
    /// The output directory. It must be empty or absent.
    pub dir: PathBuf,
    /// Optional list of whitelisted classes.
    pub class_whitelist: Option<HashSet<String>>,
}

impl EncodeStageConfig {
    pub fn options(&self) -> EncodeConfig {
        EncodeConfig {
            class_whitelist: self.class_whitelist.clone(),
        }
    }
}

fn default_images_dir() -> String {
    tfod_dataset::layout::DEFAULT_IMAGES_DIR.into()
}

fn default_annotations_dir() -> String {
    tfod_dataset::layout::DEFAULT_ANNOTATIONS_DIR.into()
}

fn default_image_extension() -> String {
    tfod_dataset::layout::DEFAULT_IMAGE_EXTENSION.into()
}

fn default_train_fraction() -> f64 {
    tfod_dataset::split::DEFAULT_TRAIN_FRACTION
}

fn default_seed() -> u64 {
    tfod_dataset::split::DEFAULT_SEED
}
