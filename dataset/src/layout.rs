use crate::common::*;

pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_ANNOTATIONS_DIR: &str = "annotations";
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";
pub const ANNOTATION_EXTENSION: &str = "xml";

/// Where the raw dataset lives on disk.
///
/// Images and annotation files are kept in two sibling directories below
/// `dataset_dir`. An annotation refers to its image by base name, which is
/// resolved with `image_extension`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLayout {
    pub dataset_dir: PathBuf,
    pub images_dir_name: String,
    pub annotations_dir_name: String,
    pub image_extension: String,
}

impl DatasetLayout {
    pub fn new(dataset_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            images_dir_name: DEFAULT_IMAGES_DIR.into(),
            annotations_dir_name: DEFAULT_ANNOTATIONS_DIR.into(),
            image_extension: DEFAULT_IMAGE_EXTENSION.into(),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dataset_dir.join(&self.images_dir_name)
    }

    pub fn annotations_dir(&self) -> PathBuf {
        self.dataset_dir.join(&self.annotations_dir_name)
    }

    /// Resolves an extension-less image name to its file path.
    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.images_dir()
            .join(format!("{}.{}", filename, self.image_extension))
    }

    pub fn annotation_files(&self) -> Result<Vec<PathBuf>> {
        crate::list_files(self.annotations_dir(), ANNOTATION_EXTENSION)
    }
}
