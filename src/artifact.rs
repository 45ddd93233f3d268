//! Artifact store: persist a fitted model as a single self-describing file
//! and read it back into an equivalent predictor.
//!
//! The file is a JSON envelope holding a format version, the model kind, the
//! encoded model and a BLAKE3 checksum of that encoding. Anything that does
//! not decode into a valid model is reported as [`ArtifactError::Corrupt`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::TrainedModel;

/// Envelope version written by [`save`] and accepted by [`load`].
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model artifact {path} does not exist")]
    NotFound { path: PathBuf },
    #[error("Model artifact {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("Failed to access model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode model for {path}: {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    format_version: u32,
    kind: String,
    /// BLAKE3 hex digest of `model`.
    checksum: String,
    /// JSON-encoded [`TrainedModel`].
    model: String,
}

/// Write `model` to `path`, creating parent directories and replacing any
/// previous file.
pub fn save(model: &TrainedModel, path: &Path) -> Result<(), ArtifactError> {
    let encode_err = |source: serde_json::Error| ArtifactError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let payload = serde_json::to_string(model).map_err(encode_err)?;
    let envelope = ArtifactEnvelope {
        format_version: FORMAT_VERSION,
        kind: model.kind_name().to_string(),
        checksum: checksum(&payload),
        model: payload,
    };
    let bytes = serde_json::to_vec_pretty(&envelope).map_err(encode_err)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, &bytes).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        kind = model.kind_name(),
        bytes = bytes.len(),
        "Saved model artifact"
    );
    Ok(())
}

/// Read the model stored at `path`.
pub fn load(path: &Path) -> Result<TrainedModel, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ArtifactError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let corrupt = |reason: String| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    if bytes.is_empty() {
        return Err(corrupt("file is empty".to_string()));
    }

    let envelope: ArtifactEnvelope = serde_json::from_slice(&bytes)
        .map_err(|err| corrupt(format!("invalid envelope: {err}")))?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            envelope.format_version
        )));
    }
    if checksum(&envelope.model) != envelope.checksum {
        return Err(corrupt("checksum mismatch".to_string()));
    }
    let model: TrainedModel = serde_json::from_str(&envelope.model)
        .map_err(|err| corrupt(format!("invalid model: {err}")))?;
    if model.kind_name() != envelope.kind {
        return Err(corrupt(format!(
            "envelope says {} but model is {}",
            envelope.kind,
            model.kind_name()
        )));
    }
    model.validate().map_err(corrupt)?;

    tracing::debug!(path = %path.display(), kind = model.kind_name(), "Loaded model artifact");
    Ok(model)
}

fn checksum(payload: &str) -> String {
    blake3::hash(payload.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{load_builtin, split};
    use crate::ml::{Classifier, ForestOptions, TrainerConfig, TreeOptions};
    use tempfile::tempdir;

    fn fitted(trainer: TrainerConfig) -> (TrainedModel, crate::dataset::SampleSet) {
        let set = load_builtin().unwrap();
        let (train, test) = split(&set, 0.2, 42, false).unwrap();
        (trainer.fit(&train).unwrap(), test)
    }

    fn small_forest() -> TrainerConfig {
        TrainerConfig::Forest(ForestOptions {
            n_trees: 12,
            ..ForestOptions::default()
        })
    }

    #[test]
    fn round_trip_predicts_identically() {
        let dir = tempdir().unwrap();
        let trainers = [
            small_forest(),
            TrainerConfig::Tree(TreeOptions {
                max_depth: Some(3),
                seed: 1,
                ..TreeOptions::default()
            }),
        ];
        for trainer in trainers {
            let (model, test) = fitted(trainer);
            let path = dir.path().join(format!("{}.joblib", model.kind_name()));
            save(&model, &path).unwrap();
            let restored = load(&path).unwrap();
            assert_eq!(restored, model);
            for idx in 0..test.len() {
                assert_eq!(restored.predict(test.row(idx)), model.predict(test.row(idx)));
            }
        }
    }

    #[test]
    fn save_creates_parent_directories_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifacts").join("model.joblib");
        let (first, _) = fitted(small_forest());
        save(&first, &path).unwrap();
        let (second, _) = fitted(TrainerConfig::Tree(TreeOptions {
            max_depth: Some(2),
            ..TreeOptions::default()
        }));
        save(&second, &path).unwrap();
        assert_eq!(load(&path).unwrap(), second);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("absent.joblib")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[test]
    fn zero_byte_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.joblib");
        fs::write(&path, b"").unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Corrupt { .. })));
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.joblib");
        fs::write(&path, b"\x80\x04not json").unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Corrupt { .. })));
    }

    #[test]
    fn edited_payload_fails_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.joblib");
        let (model, _) = fitted(TrainerConfig::Tree(TreeOptions::default()));
        save(&model, &path).unwrap();

        let mut envelope: ArtifactEnvelope =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        envelope.model = envelope.model.replacen("\"setosa\"", "\"rosa\"", 1);
        fs::write(&path, serde_json::to_vec(&envelope).unwrap()).unwrap();

        match load(&path) {
            Err(ArtifactError::Corrupt { reason, .. }) => assert_eq!(reason, "checksum mismatch"),
            other => panic!("expected corrupt artifact, got {other:?}"),
        }
    }

    #[test]
    fn unknown_version_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.joblib");
        let (model, _) = fitted(TrainerConfig::Tree(TreeOptions::default()));
        save(&model, &path).unwrap();

        let mut envelope: ArtifactEnvelope =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        envelope.format_version = FORMAT_VERSION + 1;
        fs::write(&path, serde_json::to_vec(&envelope).unwrap()).unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Corrupt { .. })));
    }

    #[test]
    fn structurally_invalid_model_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.joblib");
        let (mut model, _) = fitted(TrainerConfig::Tree(TreeOptions::default()));
        if let TrainedModel::Tree(tree) = &mut model {
            tree.nodes.clear();
        }
        save(&model, &path).unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Corrupt { .. })));
    }
}
