//! planning-ics entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use planning_core::{TracingConfig, init_tracing};
use planning_server::cli::{Cli, Command};
use planning_server::commands;
use planning_server::config::ServerConfig;
use planning_server::error::ServerResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(tracing_config(&cli)) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn tracing_config(cli: &Cli) -> TracingConfig {
    let config = if cli.debug {
        TracingConfig::cli_debug()
    } else if matches!(cli.command(), Command::Serve(_)) {
        TracingConfig::service()
    } else {
        TracingConfig::default().with_level(Level::WARN)
    };

    match cli.log_format {
        Some(format) => config.with_format(format),
        None => config,
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let config = match cli.config {
        Some(ref path) => ServerConfig::load_from(path)?,
        None => ServerConfig::load()?,
    };

    match cli.command() {
        Command::Serve(args) => commands::serve::run(config, &args).await,
        Command::Render(args) => commands::render::run(&config, &args).await,
        Command::Inspect(args) => commands::inspect::run(&args),
    }
}
