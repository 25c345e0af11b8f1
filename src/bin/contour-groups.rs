//! contour-groups CLI Binary
//!
//! Replays annotation scenarios through the interpolation group coordinator.

use anyhow::Context;
use clap::Parser;
use contour_groups::cli::{execute, Cli};
use contour_groups::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("Command failed: {:#}", e);
        eprintln!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.load_config().context("Failed to load configuration")?;

    let logging_config = build_logging_config(cli, config.logging.clone());
    init_logging(Some(&logging_config)).context("Failed to initialize logging")?;
    info!(tools = config.tools.registered.len(), "contour-groups starting");

    let output = execute(&config, &cli.command)?;
    println!("{}", output);
    Ok(())
}

/// Fold CLI flags over the configured logging settings.
fn build_logging_config(cli: &Cli, mut config: LoggingConfig) -> LoggingConfig {
    if cli.quiet {
        config.enabled = false;
    }
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
    config
}
