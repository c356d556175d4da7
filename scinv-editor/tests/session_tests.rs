//! Edit session lifecycle, persistence and re-resolution tests

use scinv_common::config::EditConfig;
use scinv_editor::{
    Address, DocumentStore, EditSession, FsStore, MutationError, SessionError, SessionState,
};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const INVENTORY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<seiscomp xmlns="http://geofon.gfz-potsdam.de/ns/seiscomp3-schema/0.12" version="0.12">
  <Inventory>
    <sensor publicID="Sensor/1" name="STS-2">
      <serialNumber>EQ-1</serialNumber>
    </sensor>
    <network code="GE">
      <station code="WLF" name="Walferdange">
        <description>Walferdange</description>
        <sensorLocation code="">
          <stream code="BHZ" sensor="Sensor/1">
            <depth>0</depth>
            <sampleRateNumerator>100</sampleRateNumerator>
            <sampleRateDenominator>1</sampleRateDenominator>
          </stream>
          <stream code="BHN" sensor="Sensor/1">
            <sampleRateNumerator>20</sampleRateNumerator>
            <sampleRateDenominator>0</sampleRateDenominator>
          </stream>
        </sensorLocation>
      </station>
    </network>
  </Inventory>
</seiscomp>
"#;

fn write_inventory(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("inventory.xml");
    fs::write(&path, INVENTORY).unwrap();
    path
}

fn address(text: &str) -> Address {
    text.parse().unwrap()
}

fn field(fields: &[(&'static str, String)], name: &str) -> String {
    fields
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.clone())
        .unwrap()
}

/// Filesystem store whose writes can be made to fail halfway
#[derive(Default)]
struct FlakyStore {
    fail_writes: Cell<bool>,
    removed: RefCell<Vec<PathBuf>>,
}

impl DocumentStore for FlakyStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        FsStore.read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if self.fail_writes.get() {
            FsStore.write(path, &contents[..contents.len() / 2])?;
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        FsStore.write(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        FsStore.rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.removed.borrow_mut().push(path.to_path_buf());
        FsStore.remove(path)
    }

    fn exists(&self, path: &Path) -> bool {
        FsStore.exists(path)
    }
}

#[test]
fn test_state_machine_transitions() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::new(&EditConfig::default());
    assert_eq!(session.state(), SessionState::Unloaded);

    session.load(&path).unwrap();
    assert_eq!(session.state(), SessionState::Loaded);

    let station = session.select_address(&address("GE.WLF")).unwrap();
    session.commit(station, &[("elevation", "295")]).unwrap();
    assert_eq!(session.state(), SessionState::Dirty);

    session.save().unwrap();
    assert_eq!(session.state(), SessionState::Loaded);
    assert!(session.last_saved().is_some());

    // Handles survive a save
    session.commit(station, &[("elevation", "300")]).unwrap();
    assert_eq!(session.state(), SessionState::Dirty);

    session.close();
    assert_eq!(session.state(), SessionState::Unloaded);
    assert!(matches!(session.save(), Err(SessionError::NotLoaded)));
}

#[test]
fn test_commit_without_change_keeps_state_loaded() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::new(&EditConfig::default());
    session.load(&path).unwrap();

    let station = session.select_address(&address("GE.WLF")).unwrap();
    let report = session.commit(station, &[("code", ""), ("description", "Walferdange")]).unwrap();
    assert!(!report.changed());
    assert_eq!(session.state(), SessionState::Loaded);
}

#[test]
fn test_save_writes_document_and_backup() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::new(&EditConfig::default());
    session.load(&path).unwrap();

    let stream = session.select_address(&address("GE.WLF..BHZ")).unwrap();
    let report = session
        .commit(stream, &[("depth", ""), ("azimuth", "90"), ("sampleRate", "40")])
        .unwrap();
    assert_eq!(report.updated, vec!["depth", "azimuth", "sampleRate"]);
    session.save().unwrap();

    let backup = dir.path().join("inventory.xml.bak");
    assert_eq!(fs::read_to_string(&backup).unwrap(), INVENTORY);

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(saved.contains("<azimuth>90</azimuth>"));
    assert!(saved.contains("<sampleRateNumerator>40</sampleRateNumerator>"));
    assert!(!saved.contains("<depth>"));

    // The written file loads again with the edits in place
    let mut reopened = EditSession::new(&EditConfig::default());
    reopened.load(&path).unwrap();
    let stream = reopened.select_address(&address("GE.WLF..BHZ")).unwrap();
    let fields = reopened.read_fields(stream).unwrap();
    assert_eq!(field(&fields, "sampleRate"), "40.0");
    assert_eq!(field(&fields, "depth"), "");
}

#[test]
fn test_failed_save_restores_original_and_stays_dirty() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::with_store(FlakyStore::default(), &EditConfig::default());
    session.load(&path).unwrap();

    let station = session.select_address(&address("GE.WLF")).unwrap();
    session.commit(station, &[("latitude", "49.66")]).unwrap();

    session.store().fail_writes.set(true);
    let err = session.save().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Common(scinv_common::Error::Persistence { .. })
    ));

    assert_eq!(session.state(), SessionState::Dirty);
    assert_eq!(fs::read_to_string(&path).unwrap(), INVENTORY);
    assert!(!dir.path().join("inventory.xml.bak").exists());
    // The half-written file is cleared before the backup moves back
    assert_eq!(*session.store().removed.borrow(), vec![path.clone()]);

    // A later save succeeds once the store recovers
    session.store().fail_writes.set(false);
    session.save().unwrap();
    assert_eq!(session.state(), SessionState::Loaded);
}

#[test]
fn test_save_without_existing_file_skips_backup() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::new(&EditConfig::default());
    session.load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    session.save().unwrap();
    assert!(path.exists());
    assert!(!dir.path().join("inventory.xml.bak").exists());
}

#[test]
fn test_handles_invalid_after_reload() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::new(&EditConfig::default());
    session.load(&path).unwrap();
    let stream = session.select_address(&address("GE.WLF..BHZ")).unwrap();

    session.load(&path).unwrap();
    let err = session.commit(stream, &[("depth", "5")]).unwrap_err();
    assert!(matches!(err, SessionError::Mutation(MutationError::StaleHandle)));
    assert!(matches!(
        session.read_fields(stream),
        Err(SessionError::Mutation(MutationError::StaleHandle))
    ));
}

#[test]
fn test_selecting_another_node_retires_previous_handle() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::new(&EditConfig::default());
    session.load(&path).unwrap();

    let bhz = session.select_address(&address("GE.WLF..BHZ")).unwrap();
    let bhn = session.select_address(&address("GE.WLF..BHN")).unwrap();
    assert_eq!(session.active(), Some(bhn));

    let err = session.commit(bhz, &[("depth", "5")]).unwrap_err();
    assert!(matches!(err, SessionError::Mutation(MutationError::StaleHandle)));
}

#[test]
fn test_failed_load_keeps_current_document() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let broken = dir.path().join("broken.xml");
    fs::write(&broken, "<seiscomp><Networks/></seiscomp>").unwrap();

    let mut session = EditSession::new(&EditConfig::default());
    session.load(&path).unwrap();
    let station = session.select_address(&address("GE.WLF")).unwrap();

    assert!(session.load(&broken).is_err());
    assert_eq!(session.path(), Some(path.as_path()));
    assert!(session.commit(station, &[("elevation", "1")]).is_ok());
}

#[test]
fn test_sample_rate_display() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::new(&EditConfig::default());
    session.load(&path).unwrap();

    let bhz = session.select_address(&address("GE.WLF..BHZ")).unwrap();
    assert_eq!(field(&session.read_fields(bhz).unwrap(), "sampleRate"), "100.0");

    let bhn = session.select_address(&address("GE.WLF..BHN")).unwrap();
    assert_eq!(field(&session.read_fields(bhn).unwrap(), "sampleRate"), "");
}

#[test]
fn test_resolution_reflects_committed_edits() {
    let dir = TempDir::new().unwrap();
    let path = write_inventory(&dir);
    let mut session = EditSession::new(&EditConfig::default());
    session.load(&path).unwrap();

    let before = session.resolve(false).unwrap();
    assert_eq!(before.records[0].stream.depth.as_ref().map(|d| d.value()), Some(0.0));
    assert_eq!(before.records[0].sensor_serial_number(), Some("EQ-1"));

    let stream = session.select_address(&address("GE.WLF..BHZ")).unwrap();
    session
        .commit(stream, &[("depth", "7.5"), ("sensorSerialNumber", "LOCAL-9")])
        .unwrap();

    let after = session.resolve(false).unwrap();
    assert_eq!(after.records[0].stream.depth.as_ref().map(|d| d.text()), Some("7.5"));
    assert_eq!(after.records[0].sensor_serial_number(), Some("LOCAL-9"));

    // Equipment edits show up on the next pass too
    let sensor = session.select_address(&address("sensor:Sensor/1")).unwrap();
    session.commit(sensor, &[("serialNumber", "EQ-2")]).unwrap();
    let after = session.resolve(true).unwrap();
    assert_eq!(after.records[1].sensor_serial_number(), Some("EQ-2"));
}
