//! Training examples in the object detection record format.

use crate::{
    common::*,
    table::{ImageGroup, LabelTable},
};

pub const KEY_HEIGHT: &str = "image/height";
pub const KEY_WIDTH: &str = "image/width";
pub const KEY_FILENAME: &str = "image/filename";
pub const KEY_SOURCE_ID: &str = "image/source_id";
pub const KEY_ENCODED: &str = "image/encoded";
pub const KEY_FORMAT: &str = "image/format";
pub const KEY_XMIN: &str = "image/object/bbox/xmin";
pub const KEY_XMAX: &str = "image/object/bbox/xmax";
pub const KEY_YMIN: &str = "image/object/bbox/ymin";
pub const KEY_YMAX: &str = "image/object/bbox/ymax";
pub const KEY_CLASS_TEXT: &str = "image/object/class/text";
pub const KEY_CLASS_LABEL: &str = "image/object/class/label";

/// One image with its boxes, ready to be serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub filename: String,
    pub source_id: String,
    /// The image file content, undecoded.
    pub encoded: Vec<u8>,
    pub format: String,
    pub size: ImageSize,
    /// Boxes in ratio units.
    pub bboxes: Vec<RatioBndBox>,
    pub classes_text: Vec<String>,
    /// Zero-based class ids.
    pub classes: Vec<i64>,
}

impl TrainingExample {
    /// Bundles an image and its rows.
    ///
    /// The image is decoded only far enough to obtain its size; the size is
    /// trusted and not compared with the table.
    pub fn from_group(
        group: &ImageGroup<'_>,
        image_dir: impl AsRef<Path>,
        schema: &LabelSchema,
        image_format: &str,
    ) -> Result<Self> {
        let path = image_dir.as_ref().join(group.filename);
        let image_read_error = |reason: String| PipelineError::ImageRead {
            path: path.clone(),
            reason,
        };

        let encoded = fs::read(&path).map_err(|err| image_read_error(err.to_string()))?;
        let size = {
            let imagesize::ImageSize { width, height } = imagesize::blob_size(&encoded)
                .map_err(|err| image_read_error(format!("{:?}", err)))?;
            ImageSize::try_from_usize(width, height)
                .map_err(|err| image_read_error(err.to_string()))?
        };

        let mut bboxes = Vec::with_capacity(group.rows.len());
        let mut classes_text = Vec::with_capacity(group.rows.len());
        let mut classes = Vec::with_capacity(group.rows.len());

        for row in &group.rows {
            let id = schema
                .id_of(&row.class_name)
                .ok_or_else(|| PipelineError::UnknownLabel {
                    label: row.class_name.clone(),
                    filename: group.filename.to_owned(),
                })?;
            bboxes.push(row.bndbox().to_ratio(&size));
            classes_text.push(row.class_name.clone());
            classes.push(id);
        }

        Ok(Self {
            filename: group.filename.to_owned(),
            source_id: group.filename.to_owned(),
            encoded,
            format: image_format.to_owned(),
            size,
            bboxes,
            classes_text,
            classes,
        })
    }

    pub fn xmins(&self) -> Vec<f32> {
        self.bboxes.iter().map(|bbox| bbox.xmin).collect()
    }

    pub fn xmaxs(&self) -> Vec<f32> {
        self.bboxes.iter().map(|bbox| bbox.xmax).collect()
    }

    pub fn ymins(&self) -> Vec<f32> {
        self.bboxes.iter().map(|bbox| bbox.ymin).collect()
    }

    pub fn ymaxs(&self) -> Vec<f32> {
        self.bboxes.iter().map(|bbox| bbox.ymax).collect()
    }

    pub fn to_example(&self) -> Example {
        let bytes = |text: &str| text.as_bytes().to_vec();

        [
            (KEY_HEIGHT, Feature::from_i64_iter([self.size.height as i64])),
            (KEY_WIDTH, Feature::from_i64_iter([self.size.width as i64])),
            (KEY_FILENAME, Feature::from_bytes_iter([bytes(self.filename.as_str())])),
            (KEY_SOURCE_ID, Feature::from_bytes_iter([bytes(self.source_id.as_str())])),
            (KEY_ENCODED, Feature::from_bytes_iter([self.encoded.clone()])),
            (KEY_FORMAT, Feature::from_bytes_iter([bytes(self.format.as_str())])),
            (KEY_XMIN, Feature::from_f32_iter(self.xmins())),
            (KEY_XMAX, Feature::from_f32_iter(self.xmaxs())),
            (KEY_YMIN, Feature::from_f32_iter(self.ymins())),
            (KEY_YMAX, Feature::from_f32_iter(self.ymaxs())),
            (
                KEY_CLASS_TEXT,
                Feature::from_bytes_iter(self.classes_text.iter().map(|text| bytes(text.as_str()))),
            ),
            (KEY_CLASS_LABEL, Feature::from_i64_iter(self.classes.iter().copied())),
        ]
        .into_iter()
        .map(|(key, feature)| (key.to_owned(), feature))
        .collect()
    }

    pub fn from_example(example: Example) -> Result<Self> {
        let mut features = example.into_hash_map();

        let height = single(int64_list(&mut features, KEY_HEIGHT)?, KEY_HEIGHT)?;
        let width = single(int64_list(&mut features, KEY_WIDTH)?, KEY_WIDTH)?;
        let size = {
            let cast = |value: i64, key: &str| {
                u32::try_from(value).map_err(|_| malformed(format!("'{}' is out of range", key)))
            };
            ImageSize::new(cast(width, KEY_WIDTH)?, cast(height, KEY_HEIGHT)?)
        };

        let mut text = |key: &str| -> Result<String> {
            let value = single(bytes_list(&mut features, key)?, key)?;
            utf8(value, key)
        };
        let filename = text(KEY_FILENAME)?;
        let source_id = text(KEY_SOURCE_ID)?;
        let format = text(KEY_FORMAT)?;
        let encoded = single(bytes_list(&mut features, KEY_ENCODED)?, KEY_ENCODED)?;

        let xmins = float_list(&mut features, KEY_XMIN)?;
        let xmaxs = float_list(&mut features, KEY_XMAX)?;
        let ymins = float_list(&mut features, KEY_YMIN)?;
        let ymaxs = float_list(&mut features, KEY_YMAX)?;
        let classes_text: Vec<String> = bytes_list(&mut features, KEY_CLASS_TEXT)?
            .into_iter()
            .map(|text| utf8(text, KEY_CLASS_TEXT))
            .try_collect()?;
        let classes = int64_list(&mut features, KEY_CLASS_LABEL)?;

        let num_objects = xmins.len();
        let lengths = [
            xmaxs.len(),
            ymins.len(),
            ymaxs.len(),
            classes_text.len(),
            classes.len(),
        ];
        if lengths.iter().any(|&len| len != num_objects) {
            return Err(malformed(format!(
                "per-object lists of '{}' have different lengths",
                filename
            )));
        }

        let bboxes = itertools::izip!(xmins, ymins, xmaxs, ymaxs)
            .map(|(xmin, ymin, xmax, ymax)| RatioBndBox::new(xmin, ymin, xmax, ymax))
            .collect();

        Ok(Self {
            filename,
            source_id,
            encoded,
            format,
            size,
            bboxes,
            classes_text,
            classes,
        })
    }
}

/// Writes one example per image of the table into a record file.
///
/// Images are visited in file name order. Any failure aborts the whole file:
/// the partially written container is removed before the error is returned.
/// Returns the number of examples written.
pub fn write_records(
    table: &LabelTable,
    image_dir: impl AsRef<Path>,
    schema: &LabelSchema,
    image_format: &str,
    output_file: impl AsRef<Path>,
) -> Result<usize> {
    let image_dir = image_dir.as_ref();
    let output_file = output_file.as_ref();

    let mut writer: ExampleWriter<_> =
        RecordWriter::create(output_file).map_err(PipelineError::record(output_file))?;

    let mut write_all = || -> Result<usize> {
        let mut count = 0;
        for group in table.group_by_filename() {
            let example = TrainingExample::from_group(&group, image_dir, schema, image_format)?;
            writer
                .send(example.to_example())
                .map_err(PipelineError::record(output_file))?;
            count += 1;
        }
        writer.flush().map_err(PipelineError::record(output_file))?;
        Ok(count)
    };

    match write_all() {
        Ok(count) => {
            info!(
                "wrote {} examples to '{}'",
                count,
                output_file.display()
            );
            Ok(count)
        }
        Err(err) => {
            drop(writer);
            warn!(
                "discarding incomplete record file '{}'",
                output_file.display()
            );
            if let Err(remove_err) = fs::remove_file(output_file) {
                warn!(
                    "unable to remove '{}': {}",
                    output_file.display(),
                    remove_err
                );
            }
            Err(err)
        }
    }
}

/// Reads back all examples of a record file.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<TrainingExample>> {
    let path = path.as_ref();
    let reader: ExampleIter<_> = RecordIter::open(path, RecordReaderConfig::default())
        .map_err(PipelineError::record(path))?;

    reader
        .map(|result| {
            let example = result.map_err(PipelineError::record(path))?;
            TrainingExample::from_example(example)
        })
        .collect()
}

type FeatureMap = HashMap<String, Feature>;

fn malformed(message: String) -> PipelineError {
    PipelineError::MalformedExample(message)
}

fn take_feature(features: &mut FeatureMap, key: &str) -> Result<FeatureKind> {
    features
        .remove(key)
        .and_then(Feature::into_kinds)
        .ok_or_else(|| malformed(format!("missing feature '{}'", key)))
}

fn int64_list(features: &mut FeatureMap, key: &str) -> Result<Vec<i64>> {
    match take_feature(features, key)? {
        FeatureKind::I64(list) => Ok(list),
        _ => Err(malformed(format!("'{}' is not an int64 list", key))),
    }
}

fn float_list(features: &mut FeatureMap, key: &str) -> Result<Vec<f32>> {
    match take_feature(features, key)? {
        FeatureKind::F32(list) => Ok(list),
        _ => Err(malformed(format!("'{}' is not a float list", key))),
    }
}

fn bytes_list(features: &mut FeatureMap, key: &str) -> Result<Vec<Vec<u8>>> {
    match take_feature(features, key)? {
        FeatureKind::Bytes(list) => Ok(list),
        _ => Err(malformed(format!("'{}' is not a bytes list", key))),
    }
}

fn single<T>(list: Vec<T>, key: &str) -> Result<T> {
    let len = list.len();
    list.into_iter().exactly_one().map_err(|_| {
        malformed(format!(
            "expect exactly one value in '{}', but get {}",
            key, len
        ))
    })
}

fn utf8(bytes: Vec<u8>, key: &str) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| malformed(format!("'{}' is not UTF-8", key)))
}
