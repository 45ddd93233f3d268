use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::ml::Classifier;
use crate::ml::tree::DecisionTree;

/// Ensemble of randomized trees voting by averaged class distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Ordered list of class identifiers shared by every tree.
    pub classes: Vec<String>,
    pub feature_len: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Validate the forest and every member tree.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("Forest has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            if tree.classes != self.classes {
                return Err(format!("Tree {idx} disagrees on the class list"));
            }
            if tree.feature_len != self.feature_len {
                return Err(format!(
                    "Tree {idx} expects {} features but the forest expects {}",
                    tree.feature_len, self.feature_len
                ));
            }
            tree.validate().map_err(|err| format!("Tree {idx}: {err}"))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: ArrayView1<'_, f32>) -> Vec<f32> {
        if features.len() != self.feature_len {
            return Vec::new();
        }
        let mut sum = vec![0.0f32; self.classes.len()];
        if self.trees.is_empty() {
            return sum;
        }
        for tree in &self.trees {
            let proba = tree.predict_proba(features);
            for (acc, p) in sum.iter_mut().zip(proba) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f32;
        for v in &mut sum {
            *v /= n;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::tree::TreeNode;
    use ndarray::aview1;

    fn leaf_tree(distribution: Vec<f32>) -> DecisionTree {
        DecisionTree {
            classes: vec!["a".into(), "b".into()],
            feature_len: 4,
            nodes: vec![TreeNode::Leaf { distribution }],
        }
    }

    #[test]
    fn averages_member_distributions() {
        let forest = RandomForest {
            classes: vec!["a".into(), "b".into()],
            feature_len: 4,
            trees: vec![
                leaf_tree(vec![1.0, 0.0]),
                leaf_tree(vec![0.0, 1.0]),
                leaf_tree(vec![0.0, 1.0]),
            ],
        };
        let x = aview1(&[0.0, 0.0, 0.0, 0.0]);
        let proba = forest.predict_proba(x);
        assert!((proba[0] - 1.0 / 3.0).abs() < 1e-6);
        assert!((proba[1] - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(forest.predict(x), Some(1));
    }

    #[test]
    fn short_feature_vector_is_not_scored() {
        let forest = RandomForest {
            classes: vec!["a".into(), "b".into()],
            feature_len: 4,
            trees: vec![leaf_tree(vec![1.0, 0.0])],
        };
        assert!(forest.predict_proba(aview1(&[5.0])).is_empty());
        assert_eq!(forest.predict_label(aview1(&[5.0])), None);
    }

    #[test]
    fn validate_rejects_mismatched_classes() {
        let mut odd = leaf_tree(vec![1.0, 0.0]);
        odd.classes = vec!["x".into(), "y".into()];
        let forest = RandomForest {
            classes: vec!["a".into(), "b".into()],
            feature_len: 4,
            trees: vec![leaf_tree(vec![1.0, 0.0]), odd],
        };
        assert!(forest.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_forest() {
        let forest = RandomForest {
            classes: vec!["a".into(), "b".into()],
            feature_len: 4,
            trees: Vec::new(),
        };
        assert!(forest.validate().is_err());
    }
}
