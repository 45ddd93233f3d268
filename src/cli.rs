//! Argument handling shared by the pipeline binaries.
//!
//! Every binary runs with no flags using its reference preset; flags only
//! override parts of it.

use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::dataset::DatasetSource;
use crate::logging;

/// Static description of one binary's command line.
#[derive(Debug, Clone, Copy)]
pub struct CliInfo {
    pub name: &'static str,
    pub summary: &'static str,
    /// Whether the binary reads or writes a model artifact.
    pub uses_artifact: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    Run(Box<PipelineConfig>),
    Help(String),
}

/// Parse `args` (without the program name) on top of `preset`.
///
/// `--config` replaces the preset wholesale; the other flags are applied
/// afterwards regardless of their position.
pub fn parse_args(
    args: Vec<String>,
    info: &CliInfo,
    preset: PipelineConfig,
) -> Result<CliAction, String> {
    let mut config_path: Option<PathBuf> = None;
    let mut dataset: Option<DatasetSource> = None;
    let mut artifact_path: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;
    let mut log_dir: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(CliAction::Help(help_text(info))),
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                dataset = Some(match value.as_str() {
                    "builtin" => DatasetSource::Builtin,
                    path => DatasetSource::Csv {
                        path: PathBuf::from(path),
                    },
                });
            }
            flag @ ("--out" | "--model") if info.uses_artifact => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| format!("{flag} requires a value"))?;
                artifact_path = Some(PathBuf::from(value));
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--log-dir" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--log-dir requires a value".to_string())?;
                log_dir = Some(PathBuf::from(value));
            }
            unknown => {
                return Err(format!(
                    "Unknown argument: {unknown}\n\n{}",
                    help_text(info)
                ));
            }
        }
        idx += 1;
    }

    let mut config = match config_path {
        Some(path) => PipelineConfig::load(&path).map_err(|err| err.to_string())?,
        None => preset,
    };
    if let Some(dataset) = dataset {
        config.dataset = dataset;
    }
    if let Some(path) = artifact_path {
        config.artifact_path = path;
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if log_dir.is_some() {
        config.log_dir = log_dir;
    }
    Ok(CliAction::Run(Box::new(config)))
}

/// Install logging for `config`, reporting but tolerating failure.
pub fn init_logging(config: &PipelineConfig) {
    if let Err(err) = logging::init(config.log_dir.as_deref()) {
        eprintln!("Logging disabled: {err}");
    }
}

pub fn help_text(info: &CliInfo) -> String {
    let mut lines = vec![
        info.name.to_string(),
        String::new(),
        info.summary.to_string(),
        String::new(),
        "Usage:".to_string(),
        format!("  {} [options]", info.name),
        String::new(),
        "Options:".to_string(),
        "  --config <file.toml>      Load the pipeline config from TOML.".to_string(),
        "  --dataset <builtin|file>  Built-in iris data or a CSV file.".to_string(),
    ];
    if info.uses_artifact {
        lines.push("  --out, --model <file>     Model artifact path.".to_string());
    }
    lines.push("  --seed <n>                Seed for the split and the trainer.".to_string());
    lines.push("  --log-dir <dir>           Also write logs to this directory.".to_string());
    lines.join("\n")
}
