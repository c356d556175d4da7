//! Common error types for scinv

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for scinv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the scinv tools
#[derive(Error, Debug)]
pub enum Error {
    /// Document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// Required container or hierarchy element absent at load
    #[error("Structural error: {0}")]
    Structural(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing the document back failed; the prior version was restored
    #[error("Persistence error for {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested node or resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
