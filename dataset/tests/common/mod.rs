#![allow(dead_code)]

use anyhow::Result;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use tfod_dataset::DatasetLayout;

pub const IMAGE_WIDTH: u32 = 48;
pub const IMAGE_HEIGHT: u32 = 32;

/// One object of a fixture annotation.
pub struct FixtureObject<'a> {
    pub class_name: &'a str,
    pub bbox: [i64; 4],
}

pub fn object(class_name: &str, bbox: [i64; 4]) -> FixtureObject<'_> {
    FixtureObject { class_name, bbox }
}

/// A scratch dataset directory with `images/` and `annotations/`.
pub struct Fixture {
    pub dir: TempDir,
    pub layout: DatasetLayout,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let layout = DatasetLayout::new(dir.path().join("extracted"));
        fs::create_dir_all(layout.images_dir())?;
        fs::create_dir_all(layout.annotations_dir())?;
        Ok(Self { dir, layout })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn add_image(&self, name: &str, width: u32, height: u32) -> Result<PathBuf> {
        let path = self.layout.image_path(name);
        image::RgbImage::new(width, height).save(&path)?;
        Ok(path)
    }

    pub fn add_annotation(
        &self,
        name: &str,
        width: u32,
        height: u32,
        objects: &[FixtureObject<'_>],
    ) -> Result<PathBuf> {
        let path = self.layout.annotations_dir().join(format!("{}.xml", name));
        fs::write(&path, annotation_xml(name, width, height, objects))?;
        Ok(path)
    }

    /// Adds an image and an annotation that agree with each other.
    pub fn add_sample(&self, name: &str, objects: &[FixtureObject<'_>]) -> Result<PathBuf> {
        self.add_image(name, IMAGE_WIDTH, IMAGE_HEIGHT)?;
        self.add_annotation(name, IMAGE_WIDTH, IMAGE_HEIGHT, objects)
    }
}

pub fn annotation_xml(name: &str, width: u32, height: u32, objects: &[FixtureObject<'_>]) -> String {
    let objects: String = objects
        .iter()
        .map(|object| {
            let [xmin, ymin, xmax, ymax] = object.bbox;
            format!(
                r#"
    <object>
        <name>{}</name>
        <pose>Unspecified</pose>
        <truncated>0</truncated>
        <difficult>0</difficult>
        <bndbox>
            <xmin>{}</xmin>
            <ymin>{}</ymin>
            <xmax>{}</xmax>
            <ymax>{}</ymax>
        </bndbox>
    </object>"#,
                object.class_name, xmin, ymin, xmax, ymax
            )
        })
        .collect();

    format!(
        r#"<annotation>
    <folder>images</folder>
    <filename>{}</filename>
    <size>
        <width>{}</width>
        <height>{}</height>
        <depth>3</depth>
    </size>
    <segmented>0</segmented>{}
</annotation>
"#,
        name, width, height, objects
    )
}

pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|path| file_name(path))
        .collect()
}

pub fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}
