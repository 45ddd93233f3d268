//! In-memory labeled sample set shared by every pipeline stage.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::DataFormatError;

/// Number of numeric features in every iris sample.
pub const N_FEATURES: usize = 4;

/// Feature column names in matrix order.
pub const FEATURE_NAMES: [&str; N_FEATURES] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// Column holding the class label in delimited sources.
pub const LABEL_COLUMN: &str = "species";

/// Immutable feature matrix paired one-to-one with class labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    classes: Vec<String>,
    features: Array2<f32>,
    labels: Vec<usize>,
}

impl SampleSet {
    /// Build a sample set, validating shape, finiteness and label range.
    pub fn new(
        classes: Vec<String>,
        features: Array2<f32>,
        labels: Vec<usize>,
    ) -> Result<Self, DataFormatError> {
        if features.ncols() != N_FEATURES {
            return Err(DataFormatError::FeatureArity {
                expected: N_FEATURES,
                found: features.ncols(),
            });
        }
        if features.nrows() != labels.len() {
            return Err(DataFormatError::LabelCount {
                rows: features.nrows(),
                labels: labels.len(),
            });
        }
        if let Some(((row, col), value)) = features
            .indexed_iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(DataFormatError::NonFinite {
                row,
                column: FEATURE_NAMES[col].to_string(),
                value: *value,
            });
        }
        if let Some((row, &label)) = labels
            .iter()
            .enumerate()
            .find(|(_, label)| **label >= classes.len())
        {
            return Err(DataFormatError::UnknownLabel { row, label });
        }
        Ok(Self {
            classes,
            features,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Ordered class names; labels index into this list.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Borrow the `n x 4` feature matrix.
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    /// `(rows, features)` of the feature matrix.
    pub fn shape(&self) -> (usize, usize) {
        self.features.dim()
    }

    /// Number of NaN or infinite feature cells.
    pub fn missing_values(&self) -> usize {
        self.features.iter().filter(|value| !value.is_finite()).count()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Borrow a single feature row.
    pub fn row(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.features.row(idx)
    }

    /// Class name of the sample at `idx`.
    pub fn label_name(&self, idx: usize) -> &str {
        &self.classes[self.labels[idx]]
    }

    /// Sample count per class index, in class order.
    pub fn class_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Copy the rows at `indices` (in that order) into a new sample set.
    ///
    /// The class list is kept intact so label indices stay comparable
    /// between subsets of the same source.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            classes: self.classes.clone(),
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&idx| self.labels[idx]).collect(),
        }
    }
}
