//! Train the reference random forest on the built-in iris set and save it.

use irisml::cli::{self, CliAction, CliInfo};
use irisml::config::PipelineConfig;
use irisml::pipeline::train_and_save;

const CLI: CliInfo = CliInfo {
    name: "irisml-train",
    summary: "Fit a 100-tree random forest on an 80/20 split and save it to iris_model.joblib.",
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

    let outcome = train_and_save(&config).map_err(|err| err.to_string())?;
    println!(
        "Trained {} on {} rows ({} held out); saved to {}",
        outcome.model.kind_name(),
        outcome.data.train.len(),
        outcome.data.test.len(),
        outcome.artifact_path.display()
    );
    Ok(())
}
