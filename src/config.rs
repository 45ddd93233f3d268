//! Pipeline configuration: where data comes from, how it is split, which
//! trainer runs, and where the artifact goes.
//!
//! Stored as TOML. Missing keys fall back to [`PipelineConfig::default`],
//! which is the forest reference run, except that an absent `min_accuracy`
//! disables the threshold check.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{DatasetSource, SplitOptions};
use crate::ml::{ForestOptions, TrainerConfig, TreeOptions};

/// Artifact written by the forest reference run.
pub const FOREST_ARTIFACT: &str = "iris_model.joblib";
/// Artifact written by the tree reference run.
pub const TREE_ARTIFACT: &str = "artifacts/model.joblib";
/// CSV read by the tree reference run.
pub const BUNDLED_CSV: &str = "data/iris.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub artifact_path: PathBuf,
    /// Accuracy the evaluation must exceed; absent skips the check.
    #[serde(default)]
    pub min_accuracy: Option<f64>,
    /// Directory for log files; absent logs to stderr only.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    pub dataset: DatasetSource,
    pub split: SplitOptions,
    pub trainer: TrainerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::forest_reference()
    }
}

impl PipelineConfig {
    /// Built-in data, unstratified 80/20 split, 100-tree forest, 0.8 threshold.
    pub fn forest_reference() -> Self {
        Self {
            artifact_path: PathBuf::from(FOREST_ARTIFACT),
            min_accuracy: Some(0.8),
            log_dir: None,
            dataset: DatasetSource::Builtin,
            split: SplitOptions {
                test_ratio: 0.2,
                seed: 42,
                stratify: false,
            },
            trainer: TrainerConfig::Forest(ForestOptions {
                seed: 42,
                ..ForestOptions::default()
            }),
        }
    }

    /// Bundled CSV, stratified 60/40 split, depth-3 tree, no threshold.
    pub fn tree_reference() -> Self {
        Self {
            artifact_path: PathBuf::from(TREE_ARTIFACT),
            min_accuracy: None,
            log_dir: None,
            dataset: DatasetSource::Csv {
                path: PathBuf::from(BUNDLED_CSV),
            },
            split: SplitOptions {
                test_ratio: 0.4,
                seed: 42,
                stratify: true,
            },
            trainer: TrainerConfig::Tree(TreeOptions {
                max_depth: Some(3),
                seed: 1,
                ..TreeOptions::default()
            }),
        }
    }

    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Use `seed` for both the split and the trainer.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split.seed = seed;
        self.trainer.set_seed(seed);
        self
    }

    /// Reject values no pipeline run could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.split.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::Invalid {
                field: "split.test_ratio",
                reason: format!("{ratio} is not between 0 and 1"),
            });
        }
        if let Some(min) = self.min_accuracy.filter(|min| !(0.0..=1.0).contains(min)) {
            return Err(ConfigError::Invalid {
                field: "min_accuracy",
                reason: format!("{min} is not between 0 and 1"),
            });
        }
        if self.artifact_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "artifact_path",
                reason: "path is empty".to_string(),
            });
        }
        Ok(())
    }
}
