//! # scinv Common Library
//!
//! Shared code for the scinv inventory tools including:
//! - Owned inventory document tree with stable node handles
//! - Schema element and attribute names
//! - Configuration loading
//! - Logging initialisation
//! - Common error type

pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod schema;

pub use document::{Document, NodeId};
pub use error::{Error, Result};
