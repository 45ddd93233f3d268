//! Random forest: bootstrapped CART trees with per-split feature sampling.

mod model;
mod train;

pub use model::RandomForest;
pub use train::{ForestOptions, MaxFeatures, train_forest};
