//! BoxSpotter - board game box identification
//!
//! Command-line front end: replays recorded scan sessions through the
//! detection pipeline and manages the scanner configuration file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use boxspotter::config::{self, AppConfig};
use boxspotter::replay::{run_scenario, Scenario};

/// BoxSpotter - identify board game boxes from camera frames
#[derive(Parser, Debug)]
#[command(name = "boxspotter")]
#[command(about = "Barcode and title stabilization for board game box scanning")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario file through the scanner
    Replay {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the default configuration
    DefaultConfig {
        /// Output path (defaults to the config file location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Replay { scenario, json } => {
            let config = load_or_default_config(args.config.as_deref())?;
            replay(&scenario, &config, json)
        }
        Command::DefaultConfig { output } => {
            let path = match output.or(args.config) {
                Some(path) => path,
                None => config::default_config_path()?,
            };
            config::save_config(&AppConfig::default(), &path)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}

/// Load configuration from file or fall back to defaults.
///
/// An explicitly given file must exist; the default location is optional.
fn load_or_default_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(path) = config::default_config_path() {
        if path.exists() {
            let config = config::load_config(&path)?;
            info!("Loaded configuration from {:?}", path);
            return Ok(config);
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

fn replay(scenario_path: &Path, config: &AppConfig, json: bool) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;

    let rt = Runtime::new().context("Failed to create tokio runtime")?;
    let report = rt.block_on(run_scenario(&scenario, config))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for detection in &report.detections {
        println!("{}", detection);
    }

    let stats = &report.stats;
    info!(
        "{} frames received, {} analyzed, {} dropped, {} detector failures",
        stats.frames_received, stats.frames_analyzed, stats.frames_dropped, stats.detector_failures
    );
    info!(
        "{} barcode and {} title detections, {} frames released",
        stats.barcodes_emitted, stats.titles_emitted, report.frames_released
    );

    Ok(())
}
