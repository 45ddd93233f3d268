//! Library exports for the pipeline binaries, benchmarks and tests.
/// Model artifact persistence.
pub mod artifact;
/// Command-line handling shared by the binaries.
pub mod cli;
/// TOML pipeline configuration and reference presets.
pub mod config;
/// Sample sets, dataset sources and the split policy.
pub mod dataset;
/// Accuracy, per-class reports and the threshold check.
pub mod evaluate;
/// Global tracing subscriber setup.
pub mod logging;
/// Classifier trainers and fitted models.
pub mod ml;
/// Stage orchestration.
pub mod pipeline;

pub use pipeline::{PipelineError, PipelineReport, Stage, run_pipeline};
