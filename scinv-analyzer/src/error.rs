//! Error types for scinv-analyzer

use thiserror::Error;

/// Analyzer error type
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Load, structure or configuration error from the shared library
    #[error(transparent)]
    Common(#[from] scinv_common::Error),

    /// Tabular export failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid option or argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;
