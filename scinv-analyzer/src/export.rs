//! Delimited-text export of a projected table

use std::fs;
use std::path::{Path, PathBuf};

use scinv_common::config::ExportConfig;
use tracing::{info, warn};

use crate::error::{AnalyzerError, Result};
use crate::projection::Table;

/// Write `table` to `<dir>/<file_name>`, creating the directory
///
/// Nothing is written for an empty table; the return value is the path of
/// the written file otherwise.
pub fn write_table(table: &Table, dir: &Path, config: &ExportConfig) -> Result<Option<PathBuf>> {
    if table.is_empty() {
        warn!("No stream records to export");
        return Ok(None);
    }
    if !config.delimiter.is_ascii() {
        return Err(AnalyzerError::InvalidInput(format!(
            "delimiter must be a single ASCII character, got '{}'",
            config.delimiter
        )));
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(&config.file_name);

    let mut writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter as u8)
        .from_path(&path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!(
        "Exported {} records ({} columns) to {}",
        table.rows.len(),
        table.columns.len(),
        path.display()
    );
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table() -> Table {
        Table {
            columns: vec!["network", "stream_comments"],
            rows: vec![vec!["GE".into(), "a; b, c".into()]],
        }
    }

    #[test]
    fn test_writes_header_and_quotes_delimiters() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("out");
        let path = write_table(&table(), &out, &ExportConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(path, out.join("unified_inventory_analysis.csv"));
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, "network,stream_comments\nGE,\"a; b, c\"\n");
    }

    #[test]
    fn test_custom_delimiter() {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig {
            delimiter: ';',
            file_name: "inv.csv".into(),
            ..Default::default()
        };
        let path = write_table(&table(), dir.path(), &config).unwrap().unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, "network;stream_comments\nGE;\"a; b, c\"\n");
    }

    #[test]
    fn test_empty_table_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let written = write_table(&Table::default(), dir.path(), &ExportConfig::default()).unwrap();
        assert!(written.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig {
            delimiter: '§',
            ..Default::default()
        };
        let err = write_table(&table(), dir.path(), &config).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidInput(_)));
    }
}
