//! scinv-editor - Field-level inventory editing
//!
//! **Usage:**
//! ```bash
//! scinv-editor inventory.xml outline
//! scinv-editor inventory.xml show GE.WLF..BHZ
//! scinv-editor inventory.xml set GE.WLF latitude=49.66 name= [--no-save]
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scinv_common::config::TomlConfig;
use scinv_common::logging;
use scinv_editor::{outline, Address, EditSession};
use std::path::PathBuf;
use tracing::info;

/// Edit a SeisComP inventory XML file
#[derive(Parser, Debug)]
#[clap(name = "scinv-editor")]
#[clap(about = "Inspect and edit stations, equipment and streams of a SeisComP inventory")]
struct Args {
    /// Path to the SeisComP XML inventory file
    inventory: PathBuf,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    /// Config file (overrides SCINV_CONFIG and default locations)
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the network tree and equipment lists with node addresses
    Outline,

    /// Print the editable fields of one node
    Show {
        /// NET.STA, NET.STA.LOC.CHA[#N], sensor:<id> or datalogger:<id>
        address: String,
    },

    /// Set fields of one node; an empty value removes optional fields
    Set {
        address: String,

        /// field=value pairs
        #[clap(required = true, value_name = "FIELD=VALUE")]
        assignments: Vec<String>,

        /// Apply the changes without writing the file
        #[clap(long)]
        no_save: bool,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((field, value)) => Ok((field.trim().to_string(), value.to_string())),
        None => bail!("expected FIELD=VALUE, got '{}'", raw),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, args.debug)?;
    info!(
        "Starting scinv-editor v{} (config: {})",
        env!("CARGO_PKG_VERSION"),
        source
    );

    let mut session = EditSession::new(&config.edit);
    session
        .load(&args.inventory)
        .with_context(|| format!("Failed to load inventory {}", args.inventory.display()))?;

    match args.command {
        Command::Outline => {
            let doc = session.document().context("no document loaded")?;
            for entry in outline(doc)? {
                println!("{entry}");
            }
        }
        Command::Show { address } => {
            let address: Address = address.parse()?;
            let handle = session.select_address(&address)?;
            println!("{} {}", handle.kind(), address);
            for (field, value) in session.read_fields(handle)? {
                println!("  {field} = {value}");
            }
        }
        Command::Set {
            address,
            assignments,
            no_save,
        } => {
            let changes = assignments
                .iter()
                .map(|raw| parse_assignment(raw))
                .collect::<Result<Vec<_>>>()?;
            let address: Address = address.parse()?;
            let handle = session.select_address(&address)?;
            let report = session.commit(handle, &changes)?;

            for field in &report.updated {
                println!("updated   {field}");
            }
            for field in &report.unchanged {
                println!("unchanged {field}");
            }
            for (field, e) in &report.failed {
                println!("rejected  {field}: {e}");
            }

            if report.changed() && !no_save {
                let path = session.save().context("Failed to save inventory")?;
                println!("saved {}", path.display());
            }
            if !report.is_clean() {
                bail!("{} field update(s) rejected", report.failed.len());
            }
        }
    }

    Ok(())
}
