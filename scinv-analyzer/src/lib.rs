//! scinv-analyzer library interface for testing
//!
//! Resolves every stream of an inventory document into one denormalized
//! record and projects the records into a flat table.

pub mod equipment;
pub mod error;
pub mod export;
pub mod index;
pub mod projection;
pub mod record;
pub mod resolver;
pub mod walker;

pub use crate::error::{AnalyzerError, Result};
pub use crate::index::{IdentifierIndex, IndexStats};
pub use crate::projection::{project, Table};
pub use crate::record::{Parsed, StreamRecord};
pub use crate::resolver::{resolve_all, resolve_all_parallel, ResolutionError, ResolutionPass};

use scinv_common::Document;
use tracing::info;

/// Build the index and resolve every stream of a loaded document
///
/// Nothing is cached between calls, so a pass always reflects the document
/// as it is now.
pub fn analyze(doc: &Document, parallel: bool) -> Result<(IndexStats, ResolutionPass)> {
    let index = IdentifierIndex::build(doc)?;
    let stats = index.stats();
    info!(
        "Indexed {} sensors, {} dataloggers, {} responses, {} PAZ responses ({} duplicate IDs)",
        stats.sensors,
        stats.dataloggers,
        stats.responses,
        stats.pole_zero_responses,
        stats.duplicates
    );

    let pass = if parallel {
        resolve_all_parallel(doc, &index)?
    } else {
        resolve_all(doc, &index)?
    };
    Ok((stats, pass))
}
