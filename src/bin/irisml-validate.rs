//! Sanity checks on the dataset: shape, label count and missing values.

use irisml::cli::{self, CliAction, CliInfo};
use irisml::config::PipelineConfig;
use irisml::dataset::{DatasetSource, IRIS_ROWS, N_FEATURES};

const CLI: CliInfo = CliInfo {
    name: "irisml-validate",
    summary: "Check that the dataset loads as n x 4 features with one label per row and no missing values.",
    uses_artifact: false,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = std::env::args().skip(1).collect();
    let config = match cli::parse_args(args, &CLI, PipelineConfig::forest_reference())? {
        CliAction::Run(config) => config,
        CliAction::Help(text) => {
            println!("{text}");
            return Ok(());
        }
    };
    cli::init_logging(&config);

    let samples = config
        .dataset
        .load()
        .map_err(|err| format!("load stage failed: {err}"))?;
    let (rows, features) = samples.shape();
    let mut failures = Vec::new();

    println!("dataset: {}", config.dataset.describe());
    println!("shape: {rows} x {features}");
    if features != N_FEATURES {
        failures.push(format!("expected {N_FEATURES} features, found {features}"));
    }
    if config.dataset == DatasetSource::Builtin && rows != IRIS_ROWS {
        failures.push(format!("expected {IRIS_ROWS} rows, found {rows}"));
    }

    let labels = samples.labels().len();
    println!("labels: {labels}");
    if labels != rows {
        failures.push(format!("{rows} rows but {labels} labels"));
    }

    let missing = samples.missing_values();
    println!("missing values: {missing}");
    if missing > 0 {
        failures.push(format!("{missing} missing feature values"));
    }

    for (class_idx, count) in samples.class_counts() {
        println!("  {:<12} {count}", samples.classes()[class_idx]);
    }

    if failures.is_empty() {
        println!("OK");
        Ok(())
    } else {
        Err(format!("validation failed: {}", failures.join("; ")))
    }
}
