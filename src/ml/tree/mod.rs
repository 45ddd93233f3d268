//! Single bounded-depth CART classification tree.
//!
//! Trees are grown greedily on Gini impurity with a seeded candidate feature
//! order, and export to the same JSON shape they load from.

mod model;
mod train;

pub use model::{DecisionTree, TreeNode};
pub use train::{TreeOptions, train_tree};
pub(crate) use train::grow_tree;
