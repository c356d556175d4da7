//! Error types for scinv-editor

use std::path::PathBuf;

use thiserror::Error;

use crate::fields::NodeKind;

/// A single field update that was rejected
///
/// The field it names is left exactly as it was.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MutationError {
    #[error("{kind} has no field '{field}'")]
    UnknownField { kind: NodeKind, field: String },

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("sample rate must be a whole number of samples per second, got {0}")]
    NonIntegralRate(f64),

    #[error("node handle belongs to an earlier load or is no longer selected")]
    StaleHandle,

    #[error("<{0}> is not an editable node")]
    NotEditable(String),
}

/// Session-level failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no document loaded")]
    NotLoaded,

    #[error("no node selected for editing")]
    NoActiveNode,

    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Load, address or persistence failure from the shared library
    #[error(transparent)]
    Common(#[from] scinv_common::Error),

    #[error(transparent)]
    Analysis(#[from] scinv_analyzer::AnalyzerError),
}

impl SessionError {
    pub(crate) fn persistence(path: PathBuf, message: impl Into<String>) -> Self {
        SessionError::Common(scinv_common::Error::Persistence {
            path,
            message: message.into(),
        })
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
