mod common;

use anyhow::Result;
use common::*;
use std::fs;
use tfod_dataset::{
    validate_annotation, validate_dataset, Field, ParseError, ValidationIssue, ValidationOutcome,
};

#[test]
fn consistent_annotation_is_kept() -> Result<()> {
    let fixture = Fixture::new()?;
    let path = fixture.add_sample("a", &[object("pistol", [0, 0, 48, 32])])?;

    let outcome = validate_annotation(&path, &fixture.layout);
    match &outcome {
        ValidationOutcome::Valid {
            annotation, image, ..
        } => {
            assert_eq!(annotation.filename, "a");
            assert_eq!(image.path, fixture.layout.image_path("a"));
            assert_eq!(image.size.width, IMAGE_WIDTH);
        }
        ValidationOutcome::Invalid(error) => panic!("unexpected error {:?}", error),
    }

    let report = validate_dataset(&fixture.layout)?;
    assert_eq!(report.num_valid(), 1);
    assert_eq!(report.num_invalid(), 0);
    assert!(path.exists());
    Ok(())
}

#[test]
fn size_mismatch_deletes_annotation_only() -> Result<()> {
    let fixture = Fixture::new()?;
    let image = fixture.add_image("a", IMAGE_WIDTH, IMAGE_HEIGHT)?;
    let path = fixture.add_annotation("a", IMAGE_WIDTH + 1, IMAGE_HEIGHT + 2, &[])?;

    let outcome = validate_annotation(&path, &fixture.layout);
    let issues = match outcome {
        ValidationOutcome::Invalid(error) => error.issues,
        outcome => panic!("unexpected outcome {:?}", outcome),
    };
    assert_eq!(
        issues,
        vec![
            ValidationIssue::WidthMismatch {
                declared: IMAGE_WIDTH + 1,
                actual: IMAGE_WIDTH
            },
            ValidationIssue::HeightMismatch {
                declared: IMAGE_HEIGHT + 2,
                actual: IMAGE_HEIGHT
            },
        ]
    );

    let report = validate_dataset(&fixture.layout)?;
    assert_eq!(report.num_invalid(), 1);
    assert_eq!(report.deleted_files().collect::<Vec<_>>(), [path.as_path()]);
    assert!(!path.exists());
    assert!(image.exists());
    Ok(())
}

#[test]
fn every_out_of_range_coordinate_is_reported() -> Result<()> {
    let fixture = Fixture::new()?;
    let path = fixture.add_sample(
        "a",
        &[
            object("pistol", [0, 0, 10, 10]),
            object("pistol", [-1, 0, 49, 10]),
            object("knife", [0, 33, 10, 10]),
        ],
    )?;

    let issues = match validate_annotation(&path, &fixture.layout) {
        ValidationOutcome::Invalid(error) => error.issues,
        outcome => panic!("unexpected outcome {:?}", outcome),
    };
    let summary: Vec<_> = issues
        .iter()
        .map(|issue| match issue {
            ValidationIssue::CoordinateOutOfRange { object, coord, .. } => {
                (*object, coord.to_string())
            }
            issue => panic!("unexpected issue {:?}", issue),
        })
        .collect();
    assert_eq!(
        summary,
        [
            (1, "xmin".to_string()),
            (1, "xmax".to_string()),
            (2, "ymin".to_string())
        ]
    );
    Ok(())
}

#[test]
fn missing_or_corrupted_image_is_invalid() -> Result<()> {
    let fixture = Fixture::new()?;
    let missing = fixture.add_annotation("missing", IMAGE_WIDTH, IMAGE_HEIGHT, &[])?;
    let corrupted = fixture.add_annotation("corrupted", IMAGE_WIDTH, IMAGE_HEIGHT, &[])?;
    fs::write(fixture.layout.image_path("corrupted"), b"garbage")?;

    for path in [&missing, &corrupted] {
        match validate_annotation(path, &fixture.layout) {
            ValidationOutcome::Invalid(error) => {
                assert!(matches!(
                    error.issues.as_slice(),
                    [ValidationIssue::ImageUnreadable { .. }]
                ));
            }
            outcome => panic!("unexpected outcome {:?}", outcome),
        }
    }

    let report = validate_dataset(&fixture.layout)?;
    assert_eq!(report.num_invalid(), 2);
    assert!(!missing.exists() && !corrupted.exists());
    assert!(fixture.layout.image_path("corrupted").exists());
    Ok(())
}

#[test]
fn parse_errors_are_listed_per_field() -> Result<()> {
    let fixture = Fixture::new()?;
    let path = fixture.layout.annotations_dir().join("broken.xml");
    fs::write(
        &path,
        "<annotation><filename>broken</filename><object><name>pistol</name></object></annotation>",
    )?;

    let issues = match validate_annotation(&path, &fixture.layout) {
        ValidationOutcome::Invalid(error) => error.issues,
        outcome => panic!("unexpected outcome {:?}", outcome),
    };
    assert_eq!(
        issues,
        vec![
            ValidationIssue::Parse(ParseError::Missing(Field::Width)),
            ValidationIssue::Parse(ParseError::Missing(Field::Height)),
            ValidationIssue::Parse(ParseError::Missing(Field::BndBox { object: 0 })),
        ]
    );
    Ok(())
}

// Only ranges are checked: a box with xmin > xmax or ymin > ymax inside the
// image still passes.
#[test]
fn flipped_box_within_image_passes() -> Result<()> {
    let fixture = Fixture::new()?;
    let path = fixture.add_sample("a", &[object("pistol", [40, 30, 10, 5])])?;
    assert!(validate_annotation(&path, &fixture.layout).is_valid());
    Ok(())
}

#[test]
fn one_bad_file_does_not_stop_the_pass() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_sample("a", &[object("pistol", [0, 0, 1, 1])])?;
    fs::write(
        fixture.layout.annotations_dir().join("b.xml"),
        "this is not xml",
    )?;
    fixture.add_sample("c", &[object("pistol", [0, 0, 1, 1])])?;

    let report = validate_dataset(&fixture.layout)?;
    assert_eq!(file_names(&report.valid_files), ["a.xml", "c.xml"]);
    assert_eq!(report.num_checked(), 3);
    Ok(())
}

#[test]
fn interleaved_objects_are_kept() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_image("a", IMAGE_WIDTH, IMAGE_HEIGHT)?;
    let path = fixture.layout.annotations_dir().join("a.xml");
    let text = format!(
        r#"<annotation verified="yes">
    <filename>a</filename>
    <path>/home/user/images/a.jpg</path>
    <object>
        <name>pistol</name>
        <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>10</xmax><ymax>10</ymax></bndbox>
    </object>
    <segmented>0</segmented>
    <size><width>{}</width><height>{}</height><depth>3</depth></size>
    <object>
        <name>knife</name>
        <bndbox><xmin>2</xmin><ymin>2</ymin><xmax>20</xmax><ymax>20</ymax></bndbox>
    </object>
</annotation>
"#,
        IMAGE_WIDTH, IMAGE_HEIGHT
    );
    fs::write(&path, text)?;

    match validate_annotation(&path, &fixture.layout) {
        ValidationOutcome::Valid { annotation, .. } => assert_eq!(annotation.objects.len(), 2),
        ValidationOutcome::Invalid(error) => panic!("unexpected error {:?}", error),
    }

    let report = validate_dataset(&fixture.layout)?;
    assert_eq!(report.num_valid(), 1);
    assert!(path.exists());
    Ok(())
}

#[test]
fn image_format_detected_from_content() -> Result<()> {
    let fixture = Fixture::new()?;
    let image = fixture.layout.image_path("a");
    image::RgbImage::new(IMAGE_WIDTH, IMAGE_HEIGHT).save_with_format(&image, image::ImageFormat::Png)?;
    let path = fixture.add_annotation("a", IMAGE_WIDTH, IMAGE_HEIGHT, &[object("pistol", [0, 0, 4, 4])])?;

    assert!(validate_annotation(&path, &fixture.layout).is_valid());
    let report = validate_dataset(&fixture.layout)?;
    assert_eq!(report.num_valid(), 1);
    assert!(path.exists());
    Ok(())
}
