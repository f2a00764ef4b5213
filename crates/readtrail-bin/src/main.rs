//! readtrail command line entry point

mod cli;
mod handlers;
mod state;

use std::process::ExitCode;

use clap::Parser;
use readtrail_core::ReadtrailConfig;

use crate::cli::{Cli, Command};
use crate::handlers::HandlerResult;
use crate::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match ReadtrailConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load config {path:?}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => ReadtrailConfig::default(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    match run(config, cli.command).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                log::error!("failed to render output: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ReadtrailConfig, command: Command) -> HandlerResult {
    let state = AppState::open(config)?;
    log::debug!("using store {:?}", state.config.storage.path);

    match command {
        Command::Sections(args) => handlers::handle_sections(&state, &args.file, args.content),
        Command::Index(args) => handlers::handle_index(&state, &args.root, &args.out),
        Command::History(command) => handlers::handle_history(&state, command).await,
        Command::List(command) => handlers::handle_list(&state, command).await,
    }
}
