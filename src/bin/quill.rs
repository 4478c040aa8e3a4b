//! Quill CLI Binary
//!
//! Command-line interface for the Quill generation engine.

use anyhow::Context;
use clap::Parser;
use quill::cli::{Cli, RunContext};
use quill::config::ConfigLoader;
use quill::logging::{init_logging, LoggingConfig};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Exit status after Ctrl-C, matching shell convention for SIGINT.
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Quill CLI starting");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling in-flight generation");
            trigger.cancel();
        }
    });

    let result = run(&cli, cancel.clone()).await;
    let code = exit_code(&result, cancel.is_cancelled());
    match result {
        Ok(output) => {
            if code == 0 {
                info!("Command completed successfully");
            }
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{:#}", e);
        }
    }
    if code != 0 {
        process::exit(code);
    }
}

/// Process exit status. Cancellation wins even when a package report was produced.
fn exit_code<T>(result: &anyhow::Result<T>, cancelled: bool) -> i32 {
    match (result, cancelled) {
        (_, true) => EXIT_CANCELLED,
        (Ok(_), false) => 0,
        (Err(_), false) => 1,
    }
}

async fn run(cli: &Cli, cancel: CancellationToken) -> anyhow::Result<String> {
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?;
    info!("CLI context initialized");

    context
        .execute(&cli.command, cancel)
        .await
        .map_err(|e| anyhow::anyhow!(quill::cli::map_error(&e)))
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }

    config
}
