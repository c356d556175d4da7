//! Edit session over one loaded document
//!
//! State machine: `Unloaded → Loaded → Dirty → Loaded` (on save), back to
//! `Unloaded` on close. Every commit that changes the document re-enters
//! `Dirty`. Exactly one node is selected for editing at a time; handles carry
//! the load generation and are rejected once another document is loaded.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use scinv_common::config::EditConfig;
use scinv_common::{Document, NodeId};
use tracing::{error, info, warn};

use crate::address::{locate, Address};
use crate::error::{MutationError, Result, SessionError};
use crate::fields::NodeKind;
use crate::mutation::{apply_fields, read_fields, CommitReport};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded,
    Dirty,
}

/// Handle to the node selected for editing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableNode {
    generation: u64,
    node: NodeId,
    kind: NodeKind,
}

impl EditableNode {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// File operations used by load and save
pub trait DocumentStore {
    fn read(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// Local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl DocumentStore for FsStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Backup location: the document path with its extension replaced by `suffix`
///
/// `inventory.xml` with `.xml.bak` becomes `inventory.xml.bak`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.with_extension("").into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

struct Loaded {
    path: PathBuf,
    document: Document,
    dirty: bool,
}

/// Single-document edit session
pub struct EditSession<S: DocumentStore = FsStore> {
    store: S,
    backup_suffix: String,
    current: Option<Loaded>,
    generation: u64,
    active: Option<EditableNode>,
    last_saved: Option<DateTime<Utc>>,
}

impl EditSession<FsStore> {
    pub fn new(config: &EditConfig) -> Self {
        Self::with_store(FsStore, config)
    }
}

impl<S: DocumentStore> EditSession<S> {
    pub fn with_store(store: S, config: &EditConfig) -> Self {
        Self {
            store,
            backup_suffix: config.backup_suffix.clone(),
            current: None,
            generation: 0,
            active: None,
            last_saved: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.current {
            None => SessionState::Unloaded,
            Some(loaded) if loaded.dirty => SessionState::Dirty,
            Some(_) => SessionState::Loaded,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.current.as_ref().map(|l| &l.document)
    }

    pub fn path(&self) -> Option<&Path> {
        self.current.as_ref().map(|l| l.path.as_path())
    }

    pub fn active(&self) -> Option<EditableNode> {
        self.active
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Time of the last successful save in this session
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    fn loaded(&self) -> Result<&Loaded> {
        self.current.as_ref().ok_or(SessionError::NotLoaded)
    }

    /// Load a document, replacing the current one
    ///
    /// On failure the current session is left as it was.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let xml = self.store.read(path).map_err(scinv_common::Error::from)?;
        let document = Document::parse(&xml)?;

        if self.state() == SessionState::Dirty {
            warn!("Discarding unsaved edits to {}", self.loaded()?.path.display());
        }
        self.generation += 1;
        self.active = None;
        self.current = Some(Loaded {
            path: path.to_path_buf(),
            document,
            dirty: false,
        });
        info!("Loaded {} for editing", path.display());
        Ok(())
    }

    /// Drop the current document
    pub fn close(&mut self) {
        if self.state() == SessionState::Dirty {
            warn!("Closing document with unsaved edits");
        }
        self.generation += 1;
        self.active = None;
        self.current = None;
    }

    /// Select a node for editing; the previous selection is dropped
    pub fn select(&mut self, node: NodeId) -> Result<EditableNode> {
        let document = &self.loaded()?.document;
        if !document.is_attached(node) {
            return Err(MutationError::StaleHandle.into());
        }
        let kind = NodeKind::of(document, node)
            .ok_or_else(|| MutationError::NotEditable(document.local_name(node).to_string()))?;
        let handle = EditableNode {
            generation: self.generation,
            node,
            kind,
        };
        self.active = Some(handle);
        Ok(handle)
    }

    /// Select the node at a textual address
    pub fn select_address(&mut self, address: &Address) -> Result<EditableNode> {
        let (node, _) = locate(&self.loaded()?.document, address)?;
        self.select(node)
    }

    fn check(&self, handle: EditableNode) -> Result<()> {
        let loaded = self.loaded()?;
        if handle.generation != self.generation || !loaded.document.is_attached(handle.node) {
            return Err(MutationError::StaleHandle.into());
        }
        match self.active {
            None => Err(SessionError::NoActiveNode),
            Some(active) if active != handle => Err(MutationError::StaleHandle.into()),
            Some(_) => Ok(()),
        }
    }

    /// Apply field values to the selected node
    ///
    /// Fields are applied independently; rejected ones are listed in the
    /// report and leave their field untouched.
    pub fn commit<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        handle: EditableNode,
        changes: &[(K, V)],
    ) -> Result<CommitReport> {
        self.check(handle)?;
        let loaded = self.current.as_mut().ok_or(SessionError::NotLoaded)?;
        let report = apply_fields(&mut loaded.document, handle.node, handle.kind, changes);
        if report.changed() {
            loaded.dirty = true;
        }
        Ok(report)
    }

    /// Current field values of the selected node
    pub fn read_fields(&self, handle: EditableNode) -> Result<Vec<(&'static str, String)>> {
        self.check(handle)?;
        let document = &self.loaded()?.document;
        Ok(read_fields(document, handle.node, handle.kind))
    }

    /// Resolve every stream of the document as it is now
    pub fn resolve(&self, parallel: bool) -> Result<scinv_analyzer::ResolutionPass> {
        let (_, pass) = scinv_analyzer::analyze(&self.loaded()?.document, parallel)?;
        Ok(pass)
    }

    /// Put the backup back under the document's name
    ///
    /// A partially written target is removed first; renaming onto an
    /// existing file fails on some platforms.
    fn restore_backup(&self, backup: &Path, path: &Path) {
        if self.store.exists(path) {
            if let Err(e) = self.store.remove(path) {
                warn!("Removing partial {} failed: {}", path.display(), e);
            }
        }
        if let Err(e) = self.store.rename(backup, path) {
            error!(
                "Restoring {} from {} failed: {}",
                path.display(),
                backup.display(),
                e
            );
        }
    }

    /// Write the document back
    ///
    /// The existing file is first renamed to its backup path. If writing the
    /// new content fails the backup is renamed back and the session stays
    /// `Dirty`. Node handles stay valid across a save.
    pub fn save(&mut self) -> Result<PathBuf> {
        let loaded = self.loaded()?;
        let path = loaded.path.clone();
        let bytes = loaded.document.to_xml_bytes()?;
        let backup = backup_path(&path, &self.backup_suffix);

        let backed_up = self.store.exists(&path);
        if backed_up {
            self.store
                .rename(&path, &backup)
                .map_err(|e| SessionError::persistence(path.clone(), format!("backup failed: {e}")))?;
        }

        if let Err(e) = self.store.write(&path, &bytes) {
            if backed_up {
                self.restore_backup(&backup, &path);
            }
            return Err(SessionError::persistence(path, format!("write failed: {e}")));
        }

        if let Some(loaded) = self.current.as_mut() {
            loaded.dirty = false;
        }
        let now = Utc::now();
        self.last_saved = Some(now);
        info!(
            "Saved {} ({} bytes) at {}",
            path.display(),
            bytes.len(),
            now.format("%Y-%m-%d %H:%M:%S UTC")
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_replaces_extension() {
        assert_eq!(
            backup_path(Path::new("/data/inventory.xml"), ".xml.bak"),
            PathBuf::from("/data/inventory.xml.bak")
        );
        assert_eq!(
            backup_path(Path::new("inventory"), ".xml.bak"),
            PathBuf::from("inventory.xml.bak")
        );
        assert_eq!(
            backup_path(Path::new("net.GE.xml"), ".bak"),
            PathBuf::from("net.GE.bak")
        );
    }

    #[test]
    fn test_unloaded_session_rejects_operations() {
        let mut session = EditSession::new(&EditConfig::default());
        assert_eq!(session.state(), SessionState::Unloaded);
        assert!(matches!(session.save(), Err(SessionError::NotLoaded)));
        assert!(matches!(session.resolve(false), Err(SessionError::NotLoaded)));
    }
}
