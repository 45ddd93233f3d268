//! Decision tree pipeline over the bundled CSV: stratified 60/40 split,
//! depth-3 tree, artifact saved to `artifacts/model.joblib`.

use irisml::cli::{self, CliAction, CliInfo};
use irisml::config::PipelineConfig;
use irisml::run_pipeline;

const CLI: CliInfo = CliInfo {
    name: "irisml",
    summary: "Train a depth-3 decision tree on iris CSV data, save it and report accuracy.",
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
    let config = match cli::parse_args(args, &CLI, PipelineConfig::tree_reference())? {
        CliAction::Run(config) => config,
        CliAction::Help(text) => {
            println!("{text}");
            return Ok(());
        }
    };
    cli::init_logging(&config);

    let report = run_pipeline(&config).map_err(|err| err.to_string())?;
    println!(
        "The accuracy of the Decision Tree is {:.3}",
        report.accuracy()
    );
    println!();
    print!("{}", report.evaluation);
    Ok(())
}
