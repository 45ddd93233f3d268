//! Reload a saved model, score it on the same held-out split it was trained
//! against, and fail unless accuracy exceeds the configured threshold.

use irisml::cli::{self, CliAction, CliInfo};
use irisml::config::PipelineConfig;
use irisml::pipeline::evaluate_saved;

const CLI: CliInfo = CliInfo {
    name: "irisml-eval",
    summary: "Evaluate iris_model.joblib on the 80/20 held-out rows; requires accuracy > 0.8.",
    uses_artifact: true,
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

    let report = evaluate_saved(&config).map_err(|err| err.to_string())?;
    print!("{}", report.evaluation);
    match config.min_accuracy {
        Some(min) => println!("PASS: accuracy {:.3} > {min:.3}", report.accuracy()),
        None => println!("accuracy {:.3} (no threshold configured)", report.accuracy()),
    }
    Ok(())
}
