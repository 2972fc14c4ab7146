mod cli;
mod config;
mod datasources;
mod error;
mod format;
mod logic;
mod models;
mod patcher;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use datasources::HydrologyTable;
use logic::{BatchRunner, RunStatus, RunSummary};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load(cli.config).context("loading configuration")?;

    if let Some(Commands::Check) = cli.command {
        return check(&config);
    }

    let hydrology = HydrologyTable::from_path(&config.paths.hru_output)
        .with_context(|| format!("loading {}", config.paths.hru_output.display()))?;
    tracing::info!(rows = hydrology.len(), "hydrology table loaded");

    let mut runner = BatchRunner::new(&config, &hydrology);
    let outcomes = runner.run().context("running batch")?;

    let summary = RunSummary::tally(&outcomes);
    println!(
        "{} field units: {} patched, {} skipped, {} failed",
        outcomes.len(),
        summary.completed,
        summary.skipped,
        summary.failed
    );
    for outcome in &outcomes {
        if let RunStatus::Failed { reason } = &outcome.status {
            println!("  FAILED {}: {}", outcome.file.display(), reason);
        }
    }

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Validate the configured inputs without touching any management file.
fn check(config: &Config) -> anyhow::Result<()> {
    let hydrology = HydrologyTable::from_path(&config.paths.hru_output)
        .with_context(|| format!("loading {}", config.paths.hru_output.display()))?;
    println!(
        "config OK: {} crops, {} hydrology rows, range {}..{}",
        config.crops.len(),
        hydrology.len(),
        config.simulation.start,
        config.simulation.end
    );
    if !config.paths.mgt_dir.is_dir() {
        anyhow::bail!(
            "management directory {} does not exist",
            config.paths.mgt_dir.display()
        );
    }
    Ok(())
}
