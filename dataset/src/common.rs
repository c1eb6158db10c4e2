//! Common imports from external crates.

pub use bbox::{Coord, ImageSize, PixelBndBox, RatioBndBox};
pub use indexmap::IndexMap;
pub use itertools::Itertools;
pub use label::LabelSchema;
pub use log::{debug, error, info, warn};
pub use rand::{seq::SliceRandom, SeedableRng};
pub use rand_chacha::ChaCha8Rng;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::{HashMap, HashSet},
    fmt, fs, io,
    path::{Path, PathBuf},
};
pub use tfrecord::{
    Example, ExampleIter, ExampleWriter, Feature, FeatureKind, RecordIter, RecordReaderConfig,
    RecordWriter,
};

pub use crate::error::{PipelineError, Result};
