//! Linear train -> persist -> evaluate pipeline.
//!
//! Stages run strictly in order: load, split, train, persist, evaluate. The
//! first failure stops the run and is returned tagged with its [`Stage`].

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::artifact::{self, ArtifactError};
use crate::config::PipelineConfig;
use crate::dataset::{DataFormatError, SampleSet, SplitError};
use crate::evaluate::{BelowThresholdError, EvaluationReport, assert_threshold, evaluate_report};
use crate::ml::{TrainError, TrainedModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Split,
    Train,
    Persist,
    Evaluate,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Split => "split",
            Stage::Train => "train",
            Stage::Persist => "persist",
            Stage::Evaluate => "evaluate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("load stage failed: {0}")]
    Data(#[from] DataFormatError),
    #[error("split stage failed: {0}")]
    Split(#[from] SplitError),
    #[error("train stage failed: {0}")]
    Train(#[from] TrainError),
    #[error("persist stage failed: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("evaluate stage failed: {0}")]
    Threshold(#[from] BelowThresholdError),
}

impl PipelineError {
    /// Stage that produced the error.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Data(_) => Stage::Load,
            PipelineError::Split(_) => Stage::Split,
            PipelineError::Train(_) => Stage::Train,
            PipelineError::Artifact(_) => Stage::Persist,
            PipelineError::Threshold(_) => Stage::Evaluate,
        }
    }
}

/// Held-out subsets derived from the configured dataset and split.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train: SampleSet,
    pub test: SampleSet,
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: TrainedModel,
    pub artifact_path: PathBuf,
    pub data: PreparedData,
}

/// Outcome of a full run or an evaluation of a saved artifact.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub model_kind: &'static str,
    pub artifact_path: PathBuf,
    pub train_size: usize,
    pub test_size: usize,
    pub evaluation: EvaluationReport,
}

impl PipelineReport {
    pub fn accuracy(&self) -> f32 {
        self.evaluation.accuracy
    }
}

/// Load the configured dataset and split it.
pub fn prepare_data(config: &PipelineConfig) -> Result<PreparedData, PipelineError> {
    tracing::info!(source = %config.dataset.describe(), "Loading dataset");
    let samples = config.dataset.load()?;
    tracing::debug!(
        rows = samples.len(),
        classes = samples.classes().len(),
        "Loaded dataset"
    );

    let (train, test) = config.split.split(&samples)?;
    Ok(PreparedData { train, test })
}

/// Load, split, fit and save; stops before evaluation.
pub fn train_and_save(config: &PipelineConfig) -> Result<TrainOutcome, PipelineError> {
    let data = prepare_data(config)?;

    tracing::info!(
        trainer = config.trainer.kind_name(),
        seed = config.trainer.seed(),
        rows = data.train.len(),
        "Training model"
    );
    let model = config.trainer.fit(&data.train)?;

    artifact::save(&model, &config.artifact_path)?;
    tracing::info!(path = %config.artifact_path.display(), "Saved model artifact");
    Ok(TrainOutcome {
        model,
        artifact_path: config.artifact_path.clone(),
        data,
    })
}

/// Re-derive the held-out subset, load the saved artifact and score it.
pub fn evaluate_saved(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    let data = prepare_data(config)?;
    evaluate_artifact(config, &config.artifact_path, &data)
}

/// Run every stage; the evaluation scores the model read back from disk.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    let span = tracing::info_span!("pipeline", trainer = config.trainer.kind_name());
    let _enter = span.enter();
    let outcome = train_and_save(config)?;
    evaluate_artifact(config, &outcome.artifact_path, &outcome.data)
}

fn evaluate_artifact(
    config: &PipelineConfig,
    path: &Path,
    data: &PreparedData,
) -> Result<PipelineReport, PipelineError> {
    let model = artifact::load(path)?;
    let evaluation = evaluate_report(&model, &data.test);
    tracing::info!(
        accuracy = evaluation.accuracy,
        test = data.test.len(),
        "Evaluated model"
    );
    if let Some(min_accuracy) = config.min_accuracy {
        assert_threshold(evaluation.accuracy, min_accuracy as f32).inspect_err(|err| {
            tracing::warn!(accuracy = err.accuracy, min_accuracy, "Accuracy below threshold");
        })?;
    }
    Ok(PipelineReport {
        model_kind: model.kind_name(),
        artifact_path: path.to_path_buf(),
        train_size: data.train.len(),
        test_size: data.test.len(),
        evaluation,
    })
}
