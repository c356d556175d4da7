//! scinv-editor library interface for testing
//!
//! Field-level editing of stations, sensors, dataloggers and streams of a
//! loaded inventory, with a backup-protected save.

pub mod address;
pub mod error;
pub mod fields;
pub mod mutation;
pub mod session;

pub use crate::address::{locate, outline, Address, OutlineEntry};
pub use crate::error::{MutationError, Result, SessionError};
pub use crate::fields::{FieldSpec, NodeKind, Target};
pub use crate::mutation::{apply_field, apply_fields, read_fields, CommitReport};
pub use crate::session::{DocumentStore, EditSession, EditableNode, FsStore, SessionState};
