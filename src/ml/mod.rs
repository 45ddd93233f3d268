//! Model trainers and the predictors they produce.
//!
//! Both variants are deterministic for a fixed seed, never mutate the
//! training set, and serialize to JSON through [`TrainedModel`].

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::SampleSet;

pub mod forest;
pub mod metrics;
pub mod tree;

pub use forest::{ForestOptions, MaxFeatures, RandomForest, train_forest};
pub use tree::{DecisionTree, TreeNode, TreeOptions, train_tree};

#[derive(Debug, Error, PartialEq)]
pub enum TrainError {
    #[error("Training set is empty")]
    EmptyTrainingSet,
    #[error("Need at least 2 classes, found {found}")]
    TooFewClasses { found: usize },
    #[error("Invalid hyperparameter {name} = {value}")]
    InvalidHyperparameter { name: &'static str, value: String },
}

/// Capability shared by every fitted model: map a feature vector to a class.
pub trait Classifier {
    /// Ordered class names; predictions index into this list.
    fn classes(&self) -> &[String];

    /// Class probabilities for a single feature vector.
    ///
    /// Returns an empty vector when `features` does not have the length the
    /// model was fitted on.
    fn predict_proba(&self, features: ArrayView1<'_, f32>) -> Vec<f32>;

    /// Most probable class index; the first class wins ties. `None` when the
    /// model cannot score `features`.
    fn predict(&self, features: ArrayView1<'_, f32>) -> Option<usize> {
        argmax(&self.predict_proba(features))
    }

    /// Most probable class name.
    fn predict_label(&self, features: ArrayView1<'_, f32>) -> Option<&str> {
        let idx = self.predict(features)?;
        self.classes().get(idx).map(String::as_str)
    }
}

/// Which classifier to fit, with its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainerConfig {
    Tree(TreeOptions),
    Forest(ForestOptions),
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig::Forest(ForestOptions::default())
    }
}

impl TrainerConfig {
    /// Fit the configured classifier on `train`.
    pub fn fit(&self, train: &SampleSet) -> Result<TrainedModel, TrainError> {
        match self {
            TrainerConfig::Tree(options) => train_tree(train, options).map(TrainedModel::Tree),
            TrainerConfig::Forest(options) => {
                train_forest(train, options).map(TrainedModel::Forest)
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TrainerConfig::Tree(_) => "tree",
            TrainerConfig::Forest(_) => "forest",
        }
    }

    /// Seed driving the trainer's randomness.
    pub fn seed(&self) -> u64 {
        match self {
            TrainerConfig::Tree(options) => options.seed,
            TrainerConfig::Forest(options) => options.seed,
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        match self {
            TrainerConfig::Tree(options) => options.seed = seed,
            TrainerConfig::Forest(options) => options.seed = seed,
        }
    }
}

/// A fitted model of either variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    Tree(DecisionTree),
    Forest(RandomForest),
}

impl TrainedModel {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TrainedModel::Tree(_) => "tree",
            TrainedModel::Forest(_) => "forest",
        }
    }

    /// Validate structural invariants of the wrapped model.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            TrainedModel::Tree(model) => model.validate(),
            TrainedModel::Forest(model) => model.validate(),
        }
    }
}

impl Classifier for TrainedModel {
    fn classes(&self) -> &[String] {
        match self {
            TrainedModel::Tree(model) => model.classes(),
            TrainedModel::Forest(model) => model.classes(),
        }
    }

    fn predict_proba(&self, features: ArrayView1<'_, f32>) -> Vec<f32> {
        match self {
            TrainedModel::Tree(model) => model.predict_proba(features),
            TrainedModel::Forest(model) => model.predict_proba(features),
        }
    }
}

pub(crate) fn check_training_set(train: &SampleSet) -> Result<(), TrainError> {
    if train.is_empty() {
        return Err(TrainError::EmptyTrainingSet);
    }
    if train.classes().len() < 2 {
        return Err(TrainError::TooFewClasses {
            found: train.classes().len(),
        });
    }
    Ok(())
}

fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if best.is_none_or(|(_, best_val)| v > best_val) {
            best = Some((idx, v));
        }
    }
    best.map(|(idx, _)| idx)
}
