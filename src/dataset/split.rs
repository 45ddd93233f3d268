//! Deterministic train/test split, optionally stratified by class.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::samples::SampleSet;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("Split ratio {ratio} must lie strictly between 0 and 1")]
    InvalidRatio { ratio: f64 },
    #[error("Class `{class}` has {available} samples; none would be held out at ratio {ratio}")]
    InsufficientData {
        class: String,
        available: usize,
        ratio: f64,
    },
    #[error("Splitting {available} samples at ratio {ratio} leaves the {subset} subset empty")]
    EmptySubset {
        subset: &'static str,
        available: usize,
        ratio: f64,
    },
}

/// Split parameters carried through configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Fraction of samples held out for evaluation.
    pub test_ratio: f64,
    pub seed: u64,
    /// Partition each class independently at `test_ratio`.
    pub stratify: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            stratify: false,
        }
    }
}

impl SplitOptions {
    pub fn split(&self, samples: &SampleSet) -> Result<(SampleSet, SampleSet), SplitError> {
        split(samples, self.test_ratio, self.seed, self.stratify)
    }
}

/// Row indices assigned to each side of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition `samples` into `(train, test)`.
///
/// `ratio` is the evaluation fraction. Identical arguments always produce
/// identical subsets, element for element.
pub fn split(
    samples: &SampleSet,
    ratio: f64,
    seed: u64,
    stratify: bool,
) -> Result<(SampleSet, SampleSet), SplitError> {
    let partition = partition_indices(samples, ratio, seed, stratify)?;
    tracing::debug!(
        train = partition.train.len(),
        test = partition.test.len(),
        ratio,
        seed,
        stratify,
        "Split sample set"
    );
    Ok((
        samples.subset(&partition.train),
        samples.subset(&partition.test),
    ))
}

/// Compute the split as row indices into `samples`.
pub fn partition_indices(
    samples: &SampleSet,
    ratio: f64,
    seed: u64,
    stratify: bool,
) -> Result<Partition, SplitError> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(SplitError::InvalidRatio { ratio });
    }
    let n = samples.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let partition = if stratify {
        let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, &label) in samples.labels().iter().enumerate() {
            by_class.entry(label).or_default().push(idx);
        }
        let mut train = Vec::with_capacity(n);
        let mut test = Vec::new();
        for (label, mut members) in by_class {
            members.shuffle(&mut rng);
            let test_n = ((members.len() as f64) * ratio).round() as usize;
            if test_n == 0 {
                return Err(SplitError::InsufficientData {
                    class: samples.classes()[label].clone(),
                    available: members.len(),
                    ratio,
                });
            }
            test.extend_from_slice(&members[..test_n]);
            train.extend_from_slice(&members[test_n..]);
        }
        train.shuffle(&mut rng);
        test.shuffle(&mut rng);
        Partition { train, test }
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let test_n = ((n as f64) * ratio).ceil() as usize;
        let train = indices.split_off(test_n.min(n));
        Partition {
            train,
            test: indices,
        }
    };

    if partition.test.is_empty() {
        return Err(SplitError::EmptySubset {
            subset: "test",
            available: n,
            ratio,
        });
    }
    if partition.train.is_empty() {
        return Err(SplitError::EmptySubset {
            subset: "train",
            available: n,
            ratio,
        });
    }
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_builtin;
    use std::collections::BTreeSet;

    #[test]
    fn rejects_ratio_outside_open_interval() {
        let set = load_builtin().unwrap();
        for ratio in [0.0, 1.0, 1.2, -0.1, f64::NAN] {
            let err = split(&set, ratio, 42, false).unwrap_err();
            assert!(matches!(err, SplitError::InvalidRatio { .. }), "{ratio}");
        }
    }

    #[test]
    fn same_arguments_give_same_partition() {
        let set = load_builtin().unwrap();
        for stratify in [false, true] {
            let a = partition_indices(&set, 0.3, 7, stratify).unwrap();
            let b = partition_indices(&set, 0.3, 7, stratify).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_seeds_shuffle_differently() {
        let set = load_builtin().unwrap();
        let a = partition_indices(&set, 0.2, 1, false).unwrap();
        let b = partition_indices(&set, 0.2, 2, false).unwrap();
        assert_ne!(a.test, b.test);
    }

    #[test]
    fn subsets_are_disjoint_and_cover_everything() {
        let set = load_builtin().unwrap();
        for stratify in [false, true] {
            let part = partition_indices(&set, 0.4, 42, stratify).unwrap();
            let train: BTreeSet<_> = part.train.iter().copied().collect();
            let test: BTreeSet<_> = part.test.iter().copied().collect();
            assert!(train.is_disjoint(&test));
            assert_eq!(train.len() + test.len(), set.len());
            assert_eq!(train.union(&test).count(), set.len());
        }
    }

    #[test]
    fn unstratified_holds_out_ceil_of_ratio() {
        let set = load_builtin().unwrap();
        let (train, test) = split(&set, 0.2, 42, false).unwrap();
        assert_eq!(test.len(), 30);
        assert_eq!(train.len(), 120);
        let (_, test) = split(&set, 0.21, 42, false).unwrap();
        assert_eq!(test.len(), 32);
    }

    #[test]
    fn stratified_per_class_fraction_within_one_sample() {
        let set = load_builtin().unwrap();
        for ratio in [0.1, 0.25, 0.4, 0.33, 0.9] {
            let (_, test) = split(&set, ratio, 42, true).unwrap();
            let totals = set.class_counts();
            let held = test.class_counts();
            for (class, &total) in &totals {
                let got = held.get(class).copied().unwrap_or(0) as f64 / total as f64;
                assert!(
                    (got - ratio).abs() <= 1.0 / total as f64,
                    "class {class} ratio {ratio}: {got}"
                );
            }
        }
    }

    #[test]
    fn stratified_sixty_forty_is_balanced() {
        let set = load_builtin().unwrap();
        let (train, test) = split(&set, 0.4, 42, true).unwrap();
        assert_eq!(test.len(), 60);
        assert_eq!(train.len(), 90);
        assert!(test.class_counts().values().all(|&count| count == 20));
    }

    #[test]
    fn stratified_fails_when_a_class_gets_no_test_samples() {
        let set = load_builtin().unwrap();
        let err = split(&set, 0.005, 42, true).unwrap_err();
        match err {
            SplitError::InsufficientData {
                class, available, ..
            } => {
                assert_eq!(class, "setosa");
                assert_eq!(available, 50);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tiny_set_reports_empty_train_subset() {
        let set = load_builtin().unwrap().subset(&[0]);
        let err = split(&set, 0.5, 42, false).unwrap_err();
        assert!(matches!(err, SplitError::EmptySubset { subset: "train", .. }));
    }
}
