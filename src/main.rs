use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use roster_recon::cleanup::cleanup_outputs;
use roster_recon::config::DEFAULT_CONFIG_PATH;
use roster_recon::{GenderDetector, Pipeline, PipelineConfig};

/// Clean the employee and sales tables, repair sale attribution and write
/// cleaned tables plus report statistics.
#[derive(Parser, Debug)]
#[command(name = "roster-recon", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Overrides the configured log level (RUST_LOG overrides both)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Delete the previous run's outputs first
    #[arg(long)]
    clean: bool,
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PipelineConfig::from_file(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_tracing(&config.filter_directive());

    if cli.clean {
        cleanup_outputs(&config.output_paths());
    }

    let detector = GenderDetector::builtin().context("loading first-name table")?;
    let pipeline = Pipeline::new(config, detector)?;
    let today = chrono::Local::now().date_naive();
    let output = pipeline.run(today).context("pipeline run failed")?;

    info!(
        run_id = %output.run_id,
        valid_employees = output.valid_employees.len(),
        valid_sales = output.valid_sales.len(),
        reassigned = output.relations.sales_reassigned,
        "done"
    );
    Ok(())
}
