//! Command-line interface: clap definitions and command routing.

use crate::config::{ConfigLoader, GroupsConfig};
use crate::error::InterpolationError;
use crate::replay::{replay_file, ReplayOptions, ReplayReport};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::path::PathBuf;

/// contour-groups - interpolation group coordination for contour annotations
#[derive(Parser)]
#[command(name = "contour-groups")]
#[command(about = "Interpolation group coordination for slice-based contour annotations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (for config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario file and print the resulting annotation groups
    Replay {
        /// Scenario file (.json or .toml)
        scenario: PathBuf,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,

        /// Mint sequential group identifiers for stable output
        #[arg(long)]
        sequential_uids: bool,
    },
    /// Print the effective configuration
    Config {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

impl Cli {
    /// Load configuration from `--config` or the workspace layers.
    pub fn load_config(&self) -> Result<GroupsConfig, InterpolationError> {
        let config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&self.workspace)?,
        };
        config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            InterpolationError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}

/// Execute a command against a loaded configuration, returning the text to print.
pub fn execute(config: &GroupsConfig, command: &Commands) -> Result<String, InterpolationError> {
    match command {
        Commands::Replay {
            scenario,
            format,
            sequential_uids,
        } => {
            let options = ReplayOptions {
                sequential_uids: *sequential_uids,
            };
            let report = replay_file(config, scenario, &options)?;
            match format.as_str() {
                "json" => to_json(&report),
                "text" => Ok(format_report_text(&report)),
                other => Err(InterpolationError::ConfigError(format!(
                    "Invalid output format: {} (must be 'text' or 'json')",
                    other
                ))),
            }
        }
        Commands::Config { format } => match format.as_str() {
            "toml" => toml::to_string_pretty(config)
                .map_err(|e| InterpolationError::ConfigError(e.to_string())),
            "json" => to_json(config),
            other => Err(InterpolationError::ConfigError(format!(
                "Invalid output format: {} (must be 'toml' or 'json')",
                other
            ))),
        },
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, InterpolationError> {
    serde_json::to_string_pretty(value).map_err(|e| InterpolationError::ConfigError(e.to_string()))
}

/// Render a replay report as step log plus annotation table.
pub fn format_report_text(report: &ReplayReport) -> String {
    let mut out = String::new();
    for step in &report.steps {
        out.push_str(&format!("{:>3}  {:<8} {}\n", step.step, step.op, step.outcome));
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Context",
            "Annotation",
            "Tool",
            "Slice",
            "Segment",
            "Group",
            "Generated",
        ]);
    for row in &report.annotations {
        table.add_row(vec![
            row.group_selector.clone(),
            row.annotation_uid.clone(),
            row.tool_name.clone(),
            row.slice_index
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{}:{}", row.segmentation_id, row.segment_index),
            row.interpolation_uid
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if row.auto_generated { "yes" } else { "no" }.to_string(),
        ]);
    }
    out.push('\n');
    out.push_str(&table.to_string());
    out.push_str(&format!(
        "\n{} annotation(s), {} engine request(s)\n",
        report.annotations.len(),
        report.engine_calls.len()
    ));
    out
}
