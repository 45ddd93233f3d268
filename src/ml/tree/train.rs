use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::model::{DecisionTree, TreeNode};
use crate::dataset::SampleSet;
use crate::ml::{TrainError, check_training_set};

/// Training hyperparameters for a single CART tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Maximum depth in edges; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it may be split.
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split.
    pub min_samples_leaf: usize,
    /// Candidate features per split; `None` considers all of them.
    pub max_features: Option<usize>,
    /// Seed for the candidate feature order.
    pub seed: u64,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 0,
        }
    }
}

impl TreeOptions {
    pub(crate) fn check(&self) -> Result<(), TrainError> {
        if self.min_samples_split < 2 {
            return Err(TrainError::InvalidHyperparameter {
                name: "min_samples_split",
                value: self.min_samples_split.to_string(),
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(TrainError::InvalidHyperparameter {
                name: "min_samples_leaf",
                value: "0".to_string(),
            });
        }
        if self.max_features == Some(0) {
            return Err(TrainError::InvalidHyperparameter {
                name: "max_features",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Fit a Gini-impurity classification tree on every row of `train`.
pub fn train_tree(train: &SampleSet, options: &TreeOptions) -> Result<DecisionTree, TrainError> {
    check_training_set(train)?;
    options.check()?;
    let tree = grow_tree(train, (0..train.len()).collect(), options);
    tracing::debug!(
        depth = tree.depth(),
        leaves = tree.n_leaves(),
        "Fitted decision tree"
    );
    Ok(tree)
}

/// Grow a tree over `indices`, which may repeat rows (bootstrap samples).
pub(crate) fn grow_tree(
    train: &SampleSet,
    mut indices: Vec<usize>,
    options: &TreeOptions,
) -> DecisionTree {
    let mut builder = TreeBuilder {
        x: train.features(),
        y: train.labels(),
        n_classes: train.classes().len(),
        options,
        rng: StdRng::seed_from_u64(options.seed),
        nodes: Vec::new(),
    };
    builder.build(&mut indices, 0);
    DecisionTree {
        classes: train.classes().to_vec(),
        feature_len: train.features().ncols(),
        nodes: builder.nodes,
    }
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f32>,
    y: &'a [usize],
    n_classes: usize,
    options: &'a TreeOptions,
    rng: StdRng,
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let counts = self.class_counts(indices);
        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            distribution: normalize(&counts),
        });

        let depth_capped = self.options.max_depth.is_some_and(|max| depth >= max);
        let pure = counts.iter().filter(|&&count| count > 0).count() <= 1;
        if depth_capped || pure || indices.len() < self.options.min_samples_split {
            return node_idx;
        }
        let Some(best) = self.best_split(indices, &counts) else {
            return node_idx;
        };

        let x = self.x;
        let mid = partition_in_place(indices, |row| x[[row, best.feature]] <= best.threshold);
        if mid == 0 || mid == indices.len() {
            return node_idx;
        }
        let (left_rows, right_rows) = indices.split_at_mut(mid);
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[node_idx] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_idx
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &row in indices {
            counts[self.y[row]] += 1;
        }
        counts
    }

    /// Lowest weighted Gini split over a seeded subset of features.
    ///
    /// Ties keep the first candidate found, so the result depends only on the
    /// rows and the seed.
    fn best_split(&mut self, indices: &[usize], counts: &[usize]) -> Option<SplitCandidate> {
        let x = self.x;
        let n_features = x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(&mut self.rng);
        let take = self
            .options
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);

        let n = indices.len();
        let min_leaf = self.options.min_samples_leaf;
        let mut order = indices.to_vec();
        let mut best: Option<SplitCandidate> = None;

        for &feature in &features[..take] {
            order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));
            let mut left = vec![0usize; self.n_classes];
            let mut right = counts.to_vec();
            for pos in 0..n - 1 {
                let label = self.y[order[pos]];
                left[label] += 1;
                right[label] -= 1;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let here = x[[order[pos], feature]];
                let next = x[[order[pos + 1], feature]];
                if here >= next {
                    continue;
                }
                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                if best.is_none_or(|b| impurity < b.impurity - 1e-12) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(here, next),
                        impurity,
                    });
                }
            }
        }
        best
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&count| {
            let p = count as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Threshold strictly below `hi` and at least `lo`.
fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi { lo } else { mid }
}

fn normalize(counts: &[usize]) -> Vec<f32> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts
        .iter()
        .map(|&count| count as f32 / total as f32)
        .collect()
}

/// Move rows satisfying `goes_left` to the front; returns how many moved.
fn partition_in_place(indices: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0usize;
    for i in 0..indices.len() {
        if goes_left(indices[i]) {
            indices.swap(mid, i);
            mid += 1;
        }
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{load_builtin, split};
    use crate::ml::Classifier;
    use ndarray::array;

    #[test]
    fn gini_of_pure_and_even_sets() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn midpoint_stays_below_upper_bound() {
        assert_eq!(midpoint(1.0, 2.0), 1.5);
        let lo = 1.0f32;
        let hi = f32::from_bits(lo.to_bits() + 1);
        assert_eq!(midpoint(lo, hi), lo);
    }

    #[test]
    fn separable_data_is_split_once() {
        let set = SampleSet::new(
            vec!["low".into(), "high".into()],
            array![
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 2.0, 0.0],
                [0.0, 0.0, 8.0, 0.0],
                [0.0, 0.0, 9.0, 0.0]
            ],
            vec![0, 0, 1, 1],
        )
        .unwrap();
        let tree = train_tree(&set, &TreeOptions::default()).unwrap();
        assert_eq!(tree.depth(), 1);
        match &tree.nodes[0] {
            TreeNode::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 2);
                assert_eq!(*threshold, 5.0);
            }
            other => panic!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn depth_cap_is_respected() {
        let set = load_builtin().unwrap();
        for max_depth in [0, 1, 2, 3] {
            let options = TreeOptions {
                max_depth: Some(max_depth),
                ..TreeOptions::default()
            };
            let tree = train_tree(&set, &options).unwrap();
            assert!(tree.depth() <= max_depth);
            tree.validate().unwrap();
        }
    }

    #[test]
    fn unbounded_tree_fits_training_rows() {
        let set = load_builtin().unwrap();
        let tree = train_tree(&set, &TreeOptions::default()).unwrap();
        let correct = (0..set.len())
            .filter(|&idx| tree.predict(set.row(idx)) == Some(set.labels()[idx]))
            .count();
        assert_eq!(correct, set.len());
    }

    #[test]
    fn fitting_is_deterministic_for_a_seed() {
        let set = load_builtin().unwrap();
        let (train, _) = split(&set, 0.4, 42, true).unwrap();
        let options = TreeOptions {
            max_depth: Some(3),
            seed: 1,
            ..TreeOptions::default()
        };
        let a = train_tree(&train, &options).unwrap();
        let b = train_tree(&train, &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fitting_leaves_input_untouched() {
        let set = load_builtin().unwrap();
        let before = set.clone();
        let _ = train_tree(&set, &TreeOptions::default()).unwrap();
        assert_eq!(set, before);
    }

    #[test]
    fn rejects_bad_hyperparameters() {
        let set = load_builtin().unwrap();
        let options = TreeOptions {
            min_samples_leaf: 0,
            ..TreeOptions::default()
        };
        assert!(matches!(
            train_tree(&set, &options),
            Err(TrainError::InvalidHyperparameter {
                name: "min_samples_leaf",
                ..
            })
        ));
    }
}
