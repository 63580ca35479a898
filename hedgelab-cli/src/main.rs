//! HedgeLab CLI: run strategy decisions against backend JSON payloads.
//!
//! Commands:
//! - `decide`: evaluate one request and print the response
//! - `batch`: evaluate JSON-lines requests in parallel, one response per line
//! - `strategies`: list registered strategy identifiers
//! - `health`: liveness check
//! - `config`: print the effective engine configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};

use hedgelab_core::service::{execute_json, health, list_strategies};
use hedgelab_core::{EngineConfig, StrategyRegistry};

#[derive(Parser)]
#[command(
    name = "hedgelab",
    about = "HedgeLab CLI - dual-direction strategy decision engine"
)]
struct Cli {
    /// Path to a TOML engine config. Defaults to the built-in thresholds.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one strategy request (JSON) and print the response.
    Decide {
        /// Request file. Reads stdin when omitted or "-".
        #[arg(long)]
        input: Option<PathBuf>,

        /// Pretty-print the response.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Evaluate one request per line (JSON lines) in parallel.
    Batch {
        /// Request file. Reads stdin when omitted or "-".
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// List registered strategies.
    Strategies,
    /// Liveness check.
    Health,
    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    structured_logger::Builder::with_level(&cli.log_level)
        .with_target_writer("*", structured_logger::json::new_writer(std::io::stderr()))
        .init();

    let config = load_config(cli.config.as_deref())?;
    log::debug!(
        close_threshold_pct = config.dual_direction.close_threshold_pct,
        cooldown_secs = config.dual_direction.cooldown_secs;
        "configuration loaded"
    );
    let registry = StrategyRegistry::with_defaults(&config);

    match cli.command {
        Commands::Decide { input, pretty } => run_decide(&registry, input.as_deref(), pretty),
        Commands::Batch { input } => run_batch(&registry, input.as_deref()),
        Commands::Strategies => print_json(&list_strategies(&registry), false),
        Commands::Health => print_json(&health(), false),
        Commands::Config => {
            print!("{}", config.to_toml());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn run_decide(registry: &StrategyRegistry, input: Option<&Path>, pretty: bool) -> Result<()> {
    let payload = read_input(input)?;
    let response = execute_json(registry, &payload);
    print_json(&response, pretty)
}

fn run_batch(registry: &StrategyRegistry, input: Option<&Path>) -> Result<()> {
    let payload = read_input(input)?;
    let lines: Vec<&str> = payload
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let responses: Vec<_> = lines
        .par_iter()
        .map(|line| execute_json(registry, line))
        .collect();

    log::info!(requests = responses.len(); "batch evaluated");
    for response in &responses {
        print_json(response, false)?;
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
