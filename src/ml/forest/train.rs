use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::model::RandomForest;
use crate::dataset::SampleSet;
use crate::ml::tree::{TreeOptions, grow_tree};
use crate::ml::{TrainError, check_training_set};

/// How many candidate features each split of a forest tree examines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `floor(sqrt(d))`, at least one.
    Sqrt,
    /// Every feature.
    All,
    /// A fixed count, clamped to `1..=d`.
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(count) => count,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Training hyperparameters for the randomized tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestOptions {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Draw each tree's rows with replacement.
    pub bootstrap: bool,
    /// Seed for row sampling and per-tree seeds.
    pub seed: u64,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Train a random forest on `train`.
///
/// One `StdRng` seeded from `options.seed` draws, per tree, a tree seed and
/// then that tree's bootstrap rows, so the ensemble is reproducible.
pub fn train_forest(
    train: &SampleSet,
    options: &ForestOptions,
) -> Result<RandomForest, TrainError> {
    check_training_set(train)?;
    if options.n_trees == 0 {
        return Err(TrainError::InvalidHyperparameter {
            name: "n_trees",
            value: "0".to_string(),
        });
    }
    if let MaxFeatures::Count(0) = options.max_features {
        return Err(TrainError::InvalidHyperparameter {
            name: "max_features",
            value: "0".to_string(),
        });
    }

    let n = train.len();
    let feature_len = train.features().ncols();
    let mut tree_options = TreeOptions {
        max_depth: options.max_depth,
        min_samples_split: options.min_samples_split,
        min_samples_leaf: options.min_samples_leaf,
        max_features: Some(options.max_features.resolve(feature_len)),
        seed: 0,
    };
    tree_options.check()?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut trees = Vec::with_capacity(options.n_trees);
    for _ in 0..options.n_trees {
        tree_options.seed = rng.random::<u64>();
        let rows: Vec<usize> = if options.bootstrap {
            (0..n).map(|_| rng.random_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        trees.push(grow_tree(train, rows, &tree_options));
    }

    tracing::debug!(
        trees = trees.len(),
        max_features = ?tree_options.max_features,
        "Fitted random forest"
    );
    Ok(RandomForest {
        classes: train.classes().to_vec(),
        feature_len,
        trees,
    })
}
