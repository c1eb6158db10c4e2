//! The dataset preparation program.

pub mod common;
pub mod config;
pub mod report;

use crate::common::*;

/// Runs a blocking stage on the blocking thread pool and waits for its result.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> tfod_dataset::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let output = tokio::task::spawn_blocking(f).await??;
    Ok(output)
}

/// Validates the dataset, deleting invalid annotation files.
pub async fn validate(config: Arc<config::Config>) -> Result<ValidatedDataset> {
    let layout = config.dataset.layout();
    info!(
        "validating dataset '{}'",
        layout.dataset_dir.display()
    );

    let validated = run_blocking(move || ValidatedDataset::validate(layout))
        .await
        .context("validation failed")?;
    report::print_validation(&validated.report);
    Ok(validated)
}

/// Splits validated annotation files into training and evaluation sets.
pub async fn split(config: Arc<config::Config>, validated: ValidatedDataset) -> Result<SplitDataset> {
    info!("splitting dataset into '{}'", config.split.dir.display());

    let split = run_blocking(move || validated.split(&config.split.dir, &config.split.options()))
        .await
        .context("split failed")?;
    report::print_split(&split);
    Ok(split)
}

/// Encodes the split dataset into tables, a label map and record files.
pub async fn encode(config: Arc<config::Config>, split: SplitDataset) -> Result<EncodedDataset> {
    info!("encoding dataset into '{}'", config.encode.dir.display());

    let encoded = run_blocking(move || split.encode(&config.encode.dir, &config.encode.options()))
        .await
        .context("encoding failed")?;
    report::print_encoded(&encoded);
    Ok(encoded)
}

/// Runs all stages in order.
pub async fn start(config: Arc<config::Config>) -> Result<EncodedDataset> {
    // validation deletes files, so output directories are checked first
    for dir in [&config.split.dir, &config.encode.dir] {
        tfod_dataset::check_empty_dir(dir)
            .with_context(|| format!("cannot write to '{}'", dir.display()))?;
    }

    let validated = validate(config.clone()).await?;
    if validated.annotation_files.is_empty() {
        warn!("no valid annotation files remain");
    }
    let split = split(config.clone(), validated).await?;
    let encoded = encode(config, split).await?;

    info!(
        "prepared {} training and {} evaluation examples",
        encoded.num_train, encoded.num_eval
    );
    Ok(encoded)
}

/// Reads a record file and prints its examples, along with the label map
/// of the same directory if there is one.
pub async fn inspect(record_file: PathBuf) -> Result<Vec<TrainingExample>> {
    let examples = {
        let path = record_file.clone();
        run_blocking(move || tfod_dataset::read_records(path))
            .await
            .with_context(|| format!("failed to read '{}'", record_file.display()))?
    };
    report::print_examples(&examples);

    let label_map = record_file.with_file_name(tfod_dataset::pipeline::LABEL_MAP_FILE);
    if label_map.is_file() {
        let schema = LabelSchema::load(&label_map)?;
        let unknown: Vec<_> = examples
            .iter()
            .flat_map(|example| &example.classes_text)
            .filter(|name| schema.id_of(name).is_none())
            .unique()
            .collect();
        if !unknown.is_empty() {
            warn!(
                "classes missing from '{}': {}",
                label_map.display(),
                unknown.iter().join(", ")
            );
        }
        report::print_schema(&schema);
    }

    Ok(examples)
}
