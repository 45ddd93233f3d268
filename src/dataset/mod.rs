//! Dataset provider: the bundled iris reference set or a CSV file, plus the
//! split policy that partitions a loaded set into train and test subsets.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod builtin;
mod csv_source;
mod samples;
pub mod split;

pub use builtin::{IRIS_CLASSES, IRIS_ROWS, load_builtin};
pub use csv_source::load_csv;
pub use samples::{FEATURE_NAMES, LABEL_COLUMN, N_FEATURES, SampleSet};
pub use split::{SplitError, SplitOptions, split};

/// Failures while reading or validating a sample set.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Required column `{column}` is missing from the header")]
    MissingColumn { column: String },
    #[error("Row {row}: column `{column}` has non-numeric value {value:?}")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Row {row}: column `{column}` has non-finite value {value}")]
    NonFinite {
        row: usize,
        column: String,
        value: f32,
    },
    #[error("Row {row}: label is empty")]
    MissingLabel { row: usize },
    #[error("Row {row}: label index {label} has no class name")]
    UnknownLabel { row: usize, label: usize },
    #[error("Expected {expected} feature columns, found {found}")]
    FeatureArity { expected: usize, found: usize },
    #[error("Feature matrix has {rows} rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },
    #[error("Dataset {path} contains no rows")]
    Empty { path: PathBuf },
    #[error("Invalid feature matrix shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Where the pipeline reads its samples from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DatasetSource {
    /// The bundled 150-row reference set.
    #[default]
    Builtin,
    /// A CSV file with a header row.
    Csv { path: PathBuf },
}

impl DatasetSource {
    /// Read the configured source into an immutable sample set.
    pub fn load(&self) -> Result<SampleSet, DataFormatError> {
        match self {
            DatasetSource::Builtin => load_builtin(),
            DatasetSource::Csv { path } => load_csv(path),
        }
    }

    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            DatasetSource::Builtin => "builtin iris".to_string(),
            DatasetSource::Csv { path } => format!("csv {}", path.display()),
        }
    }
}
