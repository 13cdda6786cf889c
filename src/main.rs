mod cli;
mod error;

use clap::Parser;
use std::process::ExitCode;

use iahris_bridge::config;
use iahris_bridge::export::ExportCoordinator;
use iahris_bridge::ingest::swat::ScenarioStore;
use iahris_bridge::logging::{self, LogLevel, Stage};

use crate::cli::{Cli, Command};
use crate::error::CliError;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = config::load_from_env()?;

    let level = if cli.verbose { LogLevel::Debug } else { config.logging.level };
    logging::init_logger(level, config.logging.file.as_deref(), config.logging.console_timestamps)?;

    match cli.command {
        Command::Scenarios { scenarios_dir } => {
            let store = ScenarioStore::open(&scenarios_dir)?;
            for scenario in store.list_scenarios()? {
                println!("{}", scenario);
            }
        }
        Command::Channels { scenarios_dir, scenario } => {
            let store = ScenarioStore::open(&scenarios_dir)?;
            let catalog = store.describe_channels(&scenario)?;
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        Command::Export(args) => {
            let request = args.to_request()?;
            let work_dir = args.work_dir.unwrap_or(config.work_dir);
            logging::debug(Stage::System, None, &format!("exporting to {}", work_dir.display()));

            let mut coordinator = ExportCoordinator::new(work_dir);
            let handoff = coordinator.run(&request)?;
            println!("{}", serde_json::to_string_pretty(&handoff)?);
        }
    }

    Ok(())
}
