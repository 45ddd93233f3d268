use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::ml::Classifier;

/// Node of a fitted tree, stored in pre-order so children always follow
/// their parent in `DecisionTree::nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal node routing `feature <= threshold` to `left`.
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    /// Terminal node holding the class distribution of its training samples.
    Leaf { distribution: Vec<f32> },
}

/// CART classification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Ordered list of class identifiers.
    pub classes: Vec<String>,
    /// Number of `f32` values per feature vector.
    pub feature_len: usize,
    /// Root is `nodes[0]`.
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Validate structural invariants of the tree.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("Tree has no classes".to_string());
        }
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.feature_len {
                        return Err(format!(
                            "Node {idx} splits on feature {feature} but only {} exist",
                            self.feature_len
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("Node {idx} has a non-finite threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("Node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { distribution } => {
                    if distribution.len() != self.classes.len() {
                        return Err(format!(
                            "Leaf {idx} has {} probabilities but expected {}",
                            distribution.len(),
                            self.classes.len()
                        ));
                    }
                    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
                        return Err(format!("Leaf {idx} has an invalid probability"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Length of the longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, idx: usize) -> usize {
        match self.nodes.get(idx) {
            Some(TreeNode::Split { left, right, .. }) => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            }
            _ => 0,
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }
}

impl Classifier for DecisionTree {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: ArrayView1<'_, f32>) -> Vec<f32> {
        if features.len() != self.feature_len {
            return Vec::new();
        }
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let Some(&value) = features.get(*feature) else {
                        return Vec::new();
                    };
                    idx = if value <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { distribution }) => return distribution.clone(),
                None => return Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::aview1;

    fn stump() -> DecisionTree {
        DecisionTree {
            classes: vec!["a".into(), "b".into()],
            feature_len: 4,
            nodes: vec![
                TreeNode::Split {
                    feature: 2,
                    threshold: 2.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    distribution: vec![1.0, 0.0],
                },
                TreeNode::Leaf {
                    distribution: vec![0.25, 0.75],
                },
            ],
        }
    }

    #[test]
    fn routes_on_threshold_inclusive_left() {
        let tree = stump();
        assert_eq!(tree.predict(aview1(&[0.0, 0.0, 2.5, 0.0])), Some(0));
        assert_eq!(tree.predict(aview1(&[0.0, 0.0, 2.6, 0.0])), Some(1));
        assert_eq!(
            tree.predict_proba(aview1(&[0.0, 0.0, 9.0, 0.0])),
            vec![0.25, 0.75]
        );
        assert_eq!(tree.predict_label(aview1(&[0.0, 0.0, 9.0, 0.0])), Some("b"));
    }

    #[test]
    fn wrong_feature_count_is_not_scored() {
        let tree = stump();
        assert!(tree.predict_proba(aview1(&[5.0])).is_empty());
        assert!(tree.predict_proba(aview1(&[0.0, 0.0, 9.0, 0.0, 1.0])).is_empty());
        assert_eq!(tree.predict(aview1(&[5.0])), None);
        assert_eq!(tree.predict_label(aview1(&[5.0])), None);
    }

    #[test]
    fn reports_shape() {
        let tree = stump();
        tree.validate().unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn validate_rejects_backward_child() {
        let mut tree = stump();
        tree.nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: 1.0,
            left: 0,
            right: 2,
        };
        assert!(tree.validate().is_err());
    }

    #[test]
    fn validate_rejects_short_distribution() {
        let mut tree = stump();
        tree.nodes[1] = TreeNode::Leaf {
            distribution: vec![1.0],
        };
        assert!(tree.validate().is_err());
    }
}
