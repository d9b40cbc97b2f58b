//! synapse-calib - connectivity-rule calibration from the command line
//!
//! # Commands
//!
//! - `synapse-calib calibrate --spec <file>` - Run the calibration loop against the simulator
//! - `synapse-calib fit --synapses <file>` - Fit the rule to one synapse table
//! - `synapse-calib check` - Show resolved settings and validate a specification
//! - `synapse-calib demo` - Calibrate against an in-process synthetic simulator
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate wires the configuration,
//! simulator, loader, estimator and controller crates into one binary.

use anyhow::Context;
use clap::{Parser, Subcommand};
use infra_config::SessionSettings;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

pub use error::{CliError, Result};

const DEFAULT_SETTINGS_FILE: &str = "synapse-calib.toml";

/// Connectivity-rule calibration CLI
#[derive(Parser)]
#[command(name = "synapse-calib")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file path (TOML); `synapse-calib.toml` is used when present
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the calibration loop against the simulator
    Calibrate(commands::calibrate::CalibrateArgs),

    /// Fit the connectivity rule to a synapse table
    Fit(commands::fit::FitArgs),

    /// Show resolved settings and validate a specification
    Check {
        /// Specification to validate
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },

    /// Calibrate against an in-process synthetic simulator
    Demo(commands::demo::DemoArgs),
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn settings_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
            fallback.exists().then_some(fallback)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = settings_path(cli.config.as_deref());
    let settings = SessionSettings::load(path.as_deref()).with_context(|| match &path {
        Some(p) => format!("failed to load settings from {}", p.display()),
        None => "failed to load settings".to_string(),
    })?;

    let level = if cli.verbose {
        "debug"
    } else {
        settings.logging.level.as_filter_str()
    };
    init_tracing(level);
    debug!(settings = ?path, "session settings resolved");

    match cli.command {
        Commands::Calibrate(args) => commands::calibrate::run(&args, settings)?,
        Commands::Fit(args) => commands::fit::run(&args, settings)?,
        Commands::Check { spec } => commands::check::run(spec.as_deref(), &settings)?,
        Commands::Demo(args) => commands::demo::run(&args, settings)?,
    }
    Ok(())
}
