//! Flat one-row-per-box tables of annotation files.

use crate::{annotation::Annotation, common::*, layout::ANNOTATION_EXTENSION};

/// The header of label tables.
pub const TABLE_COLUMNS: [&str; 8] = [
    "filename",
    "image_width",
    "image_height",
    "class",
    "xmin",
    "ymin",
    "xmax",
    "ymax",
];

/// One bounding box of one image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelRow {
    /// The image file name, extension included.
    pub filename: String,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(rename = "class")]
    pub class_name: String,
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl LabelRow {
    pub fn bndbox(&self) -> PixelBndBox {
        PixelBndBox::new(self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// The rows of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGroup<'a> {
    pub filename: &'a str,
    pub rows: Vec<&'a LabelRow>,
}

/// A label table in memory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelTable {
    pub rows: Vec<LabelRow>,
}

impl LabelTable {
    /// Reads every annotation file in `dir` into a table.
    ///
    /// Files are visited in sorted order and objects in document order. Boxes
    /// whose class is not in `class_whitelist` are dropped; `None` keeps all
    /// classes. Returns the table along with the sorted distinct classes of
    /// the kept boxes.
    pub fn from_annotation_dir(
        dir: impl AsRef<Path>,
        class_whitelist: Option<&HashSet<String>>,
        image_extension: &str,
    ) -> Result<(Self, Vec<String>)> {
        let dir = dir.as_ref();
        let mut rows = vec![];

        for path in crate::list_files(dir, ANNOTATION_EXTENSION)? {
            let annotation = Annotation::open(&path).map_err(|errors| PipelineError::Parse {
                path: path.clone(),
                errors,
            })?;
            let filename = annotation.image_file_name(image_extension);
            let ImageSize { width, height } = annotation.size;

            let kept = annotation.objects.into_iter().filter(|object| {
                class_whitelist
                    .map(|whitelist| whitelist.contains(&object.class_name))
                    .unwrap_or(true)
            });

            for object in kept {
                let PixelBndBox {
                    xmin,
                    ymin,
                    xmax,
                    ymax,
                } = object.bndbox;

                rows.push(LabelRow {
                    filename: filename.clone(),
                    image_width: width,
                    image_height: height,
                    class_name: object.class_name,
                    xmin,
                    ymin,
                    xmax,
                    ymax,
                });
            }
        }

        let table = Self { rows };
        let classes = table.classes();
        Ok((table, classes))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The sorted distinct class names of the table.
    pub fn classes(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.class_name.clone())
            .sorted()
            .dedup()
            .collect()
    }

    /// Groups rows by image file name.
    ///
    /// Groups are ordered by file name and rows keep their table order within a group.
    pub fn group_by_filename(&self) -> Vec<ImageGroup<'_>> {
        let mut groups: IndexMap<&str, Vec<&LabelRow>> = IndexMap::new();
        for row in &self.rows {
            groups.entry(row.filename.as_str()).or_default().push(row);
        }
        groups.sort_keys();
        groups
            .into_iter()
            .map(|(filename, rows)| ImageGroup { filename, rows })
            .collect()
    }

    /// Writes the table as comma-separated text with a header row.
    ///
    /// The header is present even if the table is empty.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(PipelineError::csv(path))?;

        writer
            .write_record(&TABLE_COLUMNS)
            .map_err(PipelineError::csv(path))?;
        for row in &self.rows {
            writer.serialize(row).map_err(PipelineError::csv(path))?;
        }
        writer.flush().map_err(PipelineError::io(path))?;

        Ok(())
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rows: Vec<LabelRow> = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(PipelineError::csv(path))?
            .deserialize()
            .try_collect()
            .map_err(PipelineError::csv(path))?;
        Ok(Self { rows })
    }
}
