use anyhow::{Context, Result};
use log::LevelFilter;
use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};
use structopt::StructOpt;
use tfod_dataset::{SplitDataset, ValidatedDataset};
use tfod_prepare::config::Config;

#[derive(Debug, Clone, StructOpt)]
/// Validate, split and encode an object detection dataset.
enum Args {
    /// Run validation, split and encoding in order
    Run {
        #[structopt(long, default_value = "prepare.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Delete annotation files that disagree with their images
    Validate {
        #[structopt(long, default_value = "prepare.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Copy annotation files into training and evaluation directories
    Split {
        #[structopt(long, default_value = "prepare.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Write label tables, label map and record files of a split dataset
    Encode {
        #[structopt(long, default_value = "prepare.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Print the examples stored in a record file
    Inspect {
        /// record file
        record_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // setup logging
    let mut builder = pretty_env_logger::formatted_timed_builder();
    match env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.filter_level(LevelFilter::Info),
    };
    builder.init();

    match Args::from_args() {
        Args::Run { config_file } => {
            let config = load_config(&config_file)?;
            tfod_prepare::start(config).await?;
        }
        Args::Validate { config_file } => {
            let config = load_config(&config_file)?;
            tfod_prepare::validate(config).await?;
        }
        Args::Split { config_file } => {
            let config = load_config(&config_file)?;
            let validated = ValidatedDataset::from_existing(config.dataset.layout())?;
            tfod_prepare::split(config, validated).await?;
        }
        Args::Encode { config_file } => {
            let config = load_config(&config_file)?;
            let split = SplitDataset::from_existing(config.dataset.layout(), &config.split.dir)?;
            tfod_prepare::encode(config, split).await?;
        }
        Args::Inspect { record_file } => {
            tfod_prepare::inspect(record_file).await?;
        }
    }

    Ok(())
}

fn load_config(config_file: &Path) -> Result<Arc<Config>> {
    let config = Config::open(config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;
    Ok(Arc::new(config))
}
