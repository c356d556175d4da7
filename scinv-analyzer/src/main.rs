//! scinv-analyzer - Unified inventory analysis
//!
//! Loads a SeisComP inventory, resolves every stream against the shared
//! equipment definitions and writes one CSV row per stream.
//!
//! **Usage:**
//! ```bash
//! scinv-analyzer inventory.xml [-o output] [--debug] [--config FILE] [--parallel]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use scinv_common::config::TomlConfig;
use scinv_common::{logging, Document};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Unified analysis of a SeisComP inventory XML file
#[derive(Parser, Debug)]
#[clap(name = "scinv-analyzer")]
#[clap(about = "Unified analysis of a SeisComP inventory XML file")]
struct Args {
    /// Path to the SeisComP XML inventory file
    inventory: PathBuf,

    /// Output directory for results (overrides config)
    #[clap(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    /// Config file (overrides SCINV_CONFIG and default locations)
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Resolve streams in parallel
    #[clap(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, args.debug)?;

    info!(
        "Starting scinv-analyzer v{} (config: {})",
        env!("CARGO_PKG_VERSION"),
        source
    );

    let doc = Document::load(&args.inventory)
        .with_context(|| format!("Failed to load inventory {}", args.inventory.display()))?;

    let parallel = args.parallel || config.export.parallel;
    let (_, pass) = scinv_analyzer::analyze(&doc, parallel)?;
    if !pass.failures.is_empty() {
        warn!("{} streams could not be resolved", pass.failures.len());
    }

    let table = scinv_analyzer::project(&pass.records);
    debug!("Columns: {:?}", table.columns);

    let output_dir = args.output.unwrap_or_else(|| config.export.output_dir.clone());
    if let Some(path) = scinv_analyzer::export::write_table(&table, &output_dir, &config.export)
        .context("Failed to export CSV")?
    {
        info!("Wrote {}", path.display());
    }

    Ok(())
}
