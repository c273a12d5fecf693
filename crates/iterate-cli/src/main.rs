//! iterate CLI - Main entry point

use clap::Parser;
use iterate_cli::commands::emit::EmitOptions;
use iterate_cli::{Cli, Commands};
use iterate_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Console logs go to stderr, stdout carries emitted records
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .output(LogOutput::Console)
        .log_file_prefix("iterate")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    if let Err(e) = execute_command(&cli, &cancel).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Cancel `cancel` when the process receives Ctrl-C
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, stopping iteration");
        cancel.cancel();
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, cancel: &CancellationToken) -> iterate_cli::Result<()> {
    match &cli.command {
        Commands::Count { uris } => {
            iterate_cli::commands::count::run(&cli.iterator_uri, uris, cancel).await
        }

        Commands::Emit {
            json,
            geojson,
            null,
            uris,
        } => {
            let options = EmitOptions::new(*json, *geojson, *null);
            iterate_cli::commands::emit::run(&cli.iterator_uri, uris, options, cancel).await
        }

        Commands::Schemes => iterate_cli::commands::schemes::run(),
    }
}
