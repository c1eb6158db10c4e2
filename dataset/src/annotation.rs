//! Pascal VOC style annotation documents.

use crate::common::*;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use std::str::FromStr;

/// Locates a field inside an annotation document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Filename,
    Width,
    Height,
    ClassName { object: usize },
    BndBox { object: usize },
    Coordinate { object: usize, coord: Coord },
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Field::Filename => write!(f, "filename"),
            Field::Width => write!(f, "size/width"),
            Field::Height => write!(f, "size/height"),
            Field::ClassName { object } => write!(f, "object {}: name", object),
            Field::BndBox { object } => write!(f, "object {}: bndbox", object),
            Field::Coordinate { object, coord } => {
                write!(f, "object {}: bndbox/{}", object, coord)
            }
        }
    }
}

/// A single defect found while reading an annotation document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unable to read the file: {0}")]
    Unreadable(String),
    #[error("malformed document: {0}")]
    Document(String),
    #[error("missing field '{0}'")]
    Missing(Field),
    #[error("field '{field}' has non-integer value '{value}'")]
    NotAnInteger { field: Field, value: String },
}

/// All defects of one annotation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("; "))
    }
}

impl std::error::Error for ParseErrors {}

/// A labeled bounding box.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLabel {
    pub class_name: String,
    pub bndbox: PixelBndBox,
}

/// The content of one annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// The image file name without extension.
    pub filename: String,
    /// The image size declared by the annotation.
    pub size: ImageSize,
    pub objects: Vec<ObjectLabel>,
}

impl Annotation {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ParseErrors> {
        let text = fs::read_to_string(path)
            .map_err(|err| ParseErrors(vec![ParseError::Unreadable(err.to_string())]))?;
        Self::from_xml_str(&text)
    }

    /// Parses the document, reporting every missing or malformed field.
    pub fn from_xml_str(text: &str) -> Result<Self, ParseErrors> {
        let raw: RawAnnotation = serde_xml_rs::from_str(text)
            .map_err(|err| ParseErrors(vec![ParseError::Document(err.to_string())]))?;
        let mut errors = vec![];

        let filename = text_field(raw.filename, Field::Filename, &mut errors);
        let (width, height) = match raw.size {
            Some(RawSize { width, height }) => (
                int_field::<u32>(width, Field::Width, &mut errors),
                int_field::<u32>(height, Field::Height, &mut errors),
            ),
            None => {
                errors.push(ParseError::Missing(Field::Width));
                errors.push(ParseError::Missing(Field::Height));
                (None, None)
            }
        };

        let objects: Vec<_> = raw
            .object
            .into_iter()
            .enumerate()
            .filter_map(|(object, raw)| {
                let class_name = text_field(raw.name, Field::ClassName { object }, &mut errors);
                let bndbox = match raw.bndbox {
                    Some(raw) => parse_bndbox(raw, object, &mut errors),
                    None => {
                        errors.push(ParseError::Missing(Field::BndBox { object }));
                        None
                    }
                };
                Some(ObjectLabel {
                    class_name: class_name?,
                    bndbox: bndbox?,
                })
            })
            .collect();

        match (filename, width, height) {
            (Some(filename), Some(width), Some(height)) if errors.is_empty() => Ok(Self {
                filename,
                size: ImageSize::new(width, height),
                objects,
            }),
            _ => Err(ParseErrors(errors)),
        }
    }

    /// The image file name with the given extension appended.
    pub fn image_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.filename, extension)
    }
}

/// The `<annotation>` element.
///
/// Child elements are looked up by name wherever they appear. The first
/// `filename` and `size` win, every `object` is collected, and anything else
/// is skipped. Annotation tools interleave `object` with other elements,
/// which a derived struct would reject as a duplicate field.
#[derive(Debug, Default)]
struct RawAnnotation {
    filename: Option<String>,
    size: Option<RawSize>,
    object: Vec<RawObject>,
}

impl<'de> Deserialize<'de> for RawAnnotation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawAnnotationVisitor;

        impl<'de> Visitor<'de> for RawAnnotationVisitor {
            type Value = RawAnnotation;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an annotation element")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut raw = RawAnnotation::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "filename" if raw.filename.is_none() => raw.filename = Some(map.next_value()?),
                        "size" if raw.size.is_none() => raw.size = Some(map.next_value()?),
                        "object" => raw.object.push(map.next_value()?),
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(raw)
            }
        }

        deserializer.deserialize_map(RawAnnotationVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct RawSize {
    width: Option<String>,
    height: Option<String>,
}

/// An `<object>` element, looked up the same way as [RawAnnotation].
#[derive(Debug, Default)]
struct RawObject {
    name: Option<String>,
    bndbox: Option<RawBndBox>,
}

impl<'de> Deserialize<'de> for RawObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawObjectVisitor;

        impl<'de> Visitor<'de> for RawObjectVisitor {
            type Value = RawObject;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object element")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut raw = RawObject::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "name" if raw.name.is_none() => raw.name = Some(map.next_value()?),
                        "bndbox" if raw.bndbox.is_none() => raw.bndbox = Some(map.next_value()?),
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(raw)
            }
        }

        deserializer.deserialize_map(RawObjectVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct RawBndBox {
    xmin: Option<String>,
    ymin: Option<String>,
    xmax: Option<String>,
    ymax: Option<String>,
}

fn parse_bndbox(raw: RawBndBox, object: usize, errors: &mut Vec<ParseError>) -> Option<PixelBndBox> {
    let RawBndBox {
        xmin,
        ymin,
        xmax,
        ymax,
    } = raw;
    let mut coord = |value, coord| int_field::<i64>(value, Field::Coordinate { object, coord }, errors);

    // evaluate all four so that each bad coordinate is reported
    let xmin = coord(xmin, Coord::XMin);
    let ymin = coord(ymin, Coord::YMin);
    let xmax = coord(xmax, Coord::XMax);
    let ymax = coord(ymax, Coord::YMax);

    Some(PixelBndBox::new(xmin?, ymin?, xmax?, ymax?))
}

fn text_field(value: Option<String>, field: Field, errors: &mut Vec<ParseError>) -> Option<String> {
    match value.map(|text| text.trim().to_owned()) {
        Some(text) if !text.is_empty() => Some(text),
        _ => {
            errors.push(ParseError::Missing(field));
            None
        }
    }
}

fn int_field<T>(value: Option<String>, field: Field, errors: &mut Vec<ParseError>) -> Option<T>
where
    T: FromStr,
{
    let text = text_field(value, field, errors)?;
    match text.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(ParseError::NotAnInteger { field, value: text });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"
<annotation>
    <folder>images</folder>
    <filename>armas (1)</filename>
    <size>
        <width>640</width>
        <height>480</height>
        <depth>3</depth>
    </size>
    <segmented>0</segmented>
    <object>
        <name>pistol</name>
        <pose>Unspecified</pose>
        <difficult>0</difficult>
        <bndbox>
            <xmin>10</xmin>
            <ymin>20</ymin>
            <xmax>300</xmax>
            <ymax>240</ymax>
        </bndbox>
    </object>
    <object>
        <name>knife</name>
        <bndbox>
            <xmin>0</xmin>
            <ymin>0</ymin>
            <xmax>640</xmax>
            <ymax>480</ymax>
        </bndbox>
    </object>
</annotation>
"#;

    #[test]
    fn parse_well_formed_annotation() {
        let annotation = Annotation::from_xml_str(WELL_FORMED).unwrap();
        assert_eq!(annotation.filename, "armas (1)");
        assert_eq!(annotation.size, ImageSize::new(640, 480));
        assert_eq!(annotation.image_file_name("jpg"), "armas (1).jpg");
        assert_eq!(
            annotation.objects,
            vec![
                ObjectLabel {
                    class_name: "pistol".into(),
                    bndbox: PixelBndBox::new(10, 20, 300, 240),
                },
                ObjectLabel {
                    class_name: "knife".into(),
                    bndbox: PixelBndBox::new(0, 0, 640, 480),
                },
            ]
        );
    }

    #[test]
    fn objects_interleaved_with_other_elements() {
        let text = r#"
<annotation verified="yes">
    <filename>armas (2)</filename>
    <object>
        <name>pistol</name>
        <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>
    </object>
    <segmented>0</segmented>
    <size><width>8</width><height>6</height></size>
    <object>
        <name>knife</name>
        <part>
            <name>blade</name>
            <bndbox><xmin>0</xmin><ymin>0</ymin><xmax>1</xmax><ymax>1</ymax></bndbox>
        </part>
        <bndbox><xmin>5</xmin><ymin>1</ymin><xmax>8</xmax><ymax>6</ymax></bndbox>
    </object>
    <filename>ignored</filename>
</annotation>
"#;
        let annotation = Annotation::from_xml_str(text).unwrap();
        assert_eq!(annotation.filename, "armas (2)");
        assert_eq!(annotation.size, ImageSize::new(8, 6));
        assert_eq!(
            annotation.objects,
            vec![
                ObjectLabel {
                    class_name: "pistol".into(),
                    bndbox: PixelBndBox::new(1, 2, 3, 4),
                },
                ObjectLabel {
                    class_name: "knife".into(),
                    bndbox: PixelBndBox::new(5, 1, 8, 6),
                },
            ]
        );
    }

    #[test]
    fn parse_annotation_without_objects() {
        let text = "<annotation><filename>a</filename>\
                    <size><width>4</width><height>3</height></size></annotation>";
        let annotation = Annotation::from_xml_str(text).unwrap();
        assert!(annotation.objects.is_empty());
    }

    #[test]
    fn every_defect_is_reported() {
        let text = r#"
<annotation>
    <size>
        <width>64x</width>
    </size>
    <object>
        <name>pistol</name>
        <bndbox>
            <xmin>1</xmin>
            <ymin>two</ymin>
            <xmax>3</xmax>
        </bndbox>
    </object>
    <object>
        <name>knife</name>
    </object>
</annotation>
"#;
        let errors = Annotation::from_xml_str(text).unwrap_err();
        assert_eq!(
            errors.0,
            vec![
                ParseError::Missing(Field::Filename),
                ParseError::NotAnInteger {
                    field: Field::Width,
                    value: "64x".into()
                },
                ParseError::Missing(Field::Height),
                ParseError::NotAnInteger {
                    field: Field::Coordinate {
                        object: 0,
                        coord: Coord::YMin
                    },
                    value: "two".into()
                },
                ParseError::Missing(Field::Coordinate {
                    object: 0,
                    coord: Coord::YMax
                }),
                ParseError::Missing(Field::BndBox { object: 1 }),
            ]
        );
        assert!(errors.to_string().contains("object 1: bndbox"));
    }

    #[test]
    fn malformed_document() {
        let errors = Annotation::from_xml_str("<annotation><filename>a</annotation>").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors.0[0], ParseError::Document(_)));
    }

    #[test]
    fn unreadable_file() {
        let errors = Annotation::open("/nonexistent/annotation.xml").unwrap_err();
        assert!(matches!(errors.0[0], ParseError::Unreadable(_)));
    }
}
