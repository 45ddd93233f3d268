//! Held-out accuracy and the pass/fail threshold check.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::dataset::SampleSet;
use crate::ml::Classifier;
use crate::ml::metrics::{ConfusionMatrix, PerClassStats, accuracy, precision_recall_by_class};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Accuracy {accuracy:.3} does not exceed the required {min_accuracy:.3}")]
pub struct BelowThresholdError {
    pub accuracy: f32,
    pub min_accuracy: f32,
}

/// Fraction of `test` rows whose predicted class name equals the true one.
///
/// Labels are compared by name, so the model and the test set may order
/// their classes differently. Rows the model cannot score count as wrong.
/// An empty test set scores `0.0`.
pub fn evaluate<C: Classifier + ?Sized>(model: &C, test: &SampleSet) -> f32 {
    if test.is_empty() {
        return 0.0;
    }
    let correct = (0..test.len())
        .filter(|&idx| model.predict_label(test.row(idx)) == Some(test.label_name(idx)))
        .count();
    correct as f32 / test.len() as f32
}

/// Fail unless `accuracy` is strictly above `min_accuracy`.
pub fn assert_threshold(accuracy: f32, min_accuracy: f32) -> Result<(), BelowThresholdError> {
    if accuracy > min_accuracy {
        Ok(())
    } else {
        Err(BelowThresholdError {
            accuracy,
            min_accuracy,
        })
    }
}

/// Accuracy plus a confusion matrix and per-class statistics, indexed by the
/// model's class order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub accuracy: f32,
    pub classes: Vec<String>,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<PerClassStats>,
    /// Test rows whose true class the model does not know.
    pub unknown_labels: usize,
}

pub fn evaluate_report<C: Classifier + ?Sized>(model: &C, test: &SampleSet) -> EvaluationReport {
    let classes = model.classes().to_vec();
    let mut pairs = Vec::with_capacity(test.len());
    let mut unknown_labels = 0usize;
    for idx in 0..test.len() {
        let truth = test.label_name(idx);
        let Some(truth_idx) = classes.iter().position(|name| name == truth) else {
            unknown_labels += 1;
            continue;
        };
        if let Some(predicted) = model.predict(test.row(idx)) {
            pairs.push((truth_idx, predicted));
        }
    }
    let confusion = ConfusionMatrix::from_pairs(classes.len(), pairs);
    let per_class = precision_recall_by_class(&confusion);
    // Unknown truths and unscored rows are missing from the matrix.
    let accuracy = if confusion.total() == test.len() as u64 {
        accuracy(&confusion)
    } else {
        evaluate(model, test)
    };
    EvaluationReport {
        accuracy,
        classes,
        confusion,
        per_class,
        unknown_labels,
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "accuracy: {:.4}", self.accuracy)?;
        for (idx, stats) in self.per_class.iter().enumerate() {
            writeln!(
                f,
                "class {:>2} {:<12}  precision={:.3}  recall={:.3}  f1={:.3}  support={}",
                idx, self.classes[idx], stats.precision, stats.recall, stats.f1, stats.support
            )?;
        }
        writeln!(f, "confusion matrix (rows=true, cols=pred):")?;
        for truth in 0..self.confusion.n_classes {
            let mut row = String::new();
            for pred in 0..self.confusion.n_classes {
                row.push_str(&format!("{:6}", self.confusion.get(truth, pred)));
            }
            writeln!(f, "{row}")?;
        }
        if self.unknown_labels > 0 {
            writeln!(f, "{} rows had a class unknown to the model", self.unknown_labels)?;
        }
        Ok(())
    }
}
