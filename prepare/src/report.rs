//! Stage summaries printed to the terminal.

use crate::common::*;

pub fn print_validation(report: &ValidationReport) {
    let mut table = Table::new();
    table.add_row(row!["checked", "valid", "invalid"]);
    table.add_row(row![
        report.num_checked(),
        report.num_valid(),
        report.num_invalid()
    ]);
    table.printstd();

    if report.errors.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["invalid file", "errors", "deleted"]);
    report.errors.iter().for_each(|error| {
        let undeleted = report
            .undeleted
            .iter()
            .find(|file| file.path == error.annotation_file);
        let deleted = match undeleted {
            Some(file) => format!("no: {}", file.reason),
            None => "yes".to_string(),
        };
        table.add_row(row![
            error.annotation_file.display(),
            error.issues.iter().join("\n"),
            deleted
        ]);
    });
    table.printstd();
}

pub fn print_split(split: &SplitDataset) {
    let mut table = Table::new();
    table.add_row(row!["subset", "files", "directory"]);
    table.add_row(row![
        "train",
        split.train_files.len(),
        split.train_dir.display()
    ]);
    table.add_row(row!["eval", split.eval_files.len(), split.eval_dir.display()]);
    table.printstd();
}

pub fn print_encoded(encoded: &EncodedDataset) {
    let mut table = Table::new();
    table.add_row(row!["output", "path"]);
    table.add_row(row![
        format!("train records ({})", encoded.num_train),
        encoded.train_record.display()
    ]);
    table.add_row(row![
        format!("eval records ({})", encoded.num_eval),
        encoded.eval_record.display()
    ]);
    table.add_row(row!["train table", encoded.train_csv.display()]);
    table.add_row(row!["eval table", encoded.eval_csv.display()]);
    table.add_row(row!["label map", encoded.label_map.display()]);
    table.printstd();

    print_schema(&encoded.schema);
}

pub fn print_schema(schema: &LabelSchema) {
    let mut table = Table::new();
    table.add_row(row!["id", "label map id", "class"]);
    schema.label_to_id().for_each(|(name, id)| {
        table.add_row(row![id, id + 1, name]);
    });
    table.printstd();
}

pub fn print_examples(examples: &[TrainingExample]) {
    let mut table = Table::new();
    table.add_row(row!["filename", "format", "size", "bytes", "boxes", "classes"]);
    examples.iter().for_each(|example| {
        table.add_row(row![
            example.filename,
            example.format,
            example.size,
            example.encoded.len(),
            example.bboxes.len(),
            example
                .classes_text
                .iter()
                .zip(&example.classes)
                .map(|(text, id)| format!("{}:{}", id, text))
                .join(", ")
        ]);
    });
    table.printstd();
}
