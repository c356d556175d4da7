//! Identifier index over shared equipment definitions
//!
//! Built once per loaded document, read-only afterwards. Lookups by
//! `publicID` are constant time per kind.

use std::collections::HashMap;

use scinv_common::schema::element;
use scinv_common::{Document, Result};
use tracing::{debug, warn};

use crate::equipment::{
    Datalogger, EquipmentKind, EquipmentRecord, PoleZeroResponse, Response, Sensor,
};

/// Per-kind counts reported after indexing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub sensors: usize,
    pub dataloggers: usize,
    pub responses: usize,
    pub pole_zero_responses: usize,
    /// Definitions that replaced an earlier one with the same `publicID`
    pub duplicates: usize,
}

/// `publicID` to equipment lookup tables, one per kind
#[derive(Debug, Default)]
pub struct IdentifierIndex {
    sensors: HashMap<String, Sensor>,
    dataloggers: HashMap<String, Datalogger>,
    responses: HashMap<String, Response>,
    pole_zero: HashMap<String, PoleZeroResponse>,
    duplicates: usize,
}

impl IdentifierIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every equipment definition found below `Inventory`
    ///
    /// When two definitions of one kind share a `publicID`, the later one in
    /// document order wins and the collision is logged.
    pub fn build(doc: &Document) -> Result<Self> {
        let inventory = doc.inventory()?;
        let mut index = Self::new();

        for kind in [
            element::SENSOR,
            element::DATALOGGER,
            element::RESPONSE,
            element::RESPONSE_PAZ,
        ] {
            for node in doc.descendants_named(inventory, kind) {
                match EquipmentRecord::decode(doc, node) {
                    Some(record) => {
                        index.insert(record);
                    }
                    None => warn!("Skipping <{}> definition without publicID", kind),
                }
            }
        }

        debug!("Identifier index built: {:?}", index.stats());
        Ok(index)
    }

    /// Add a record, returning the one it replaced
    pub fn insert(&mut self, record: EquipmentRecord) -> Option<EquipmentRecord> {
        let kind = record.kind();
        let id = record.public_id().to_string();
        let previous = match record {
            EquipmentRecord::Sensor(s) => self
                .sensors
                .insert(id.clone(), s)
                .map(EquipmentRecord::Sensor),
            EquipmentRecord::Datalogger(d) => self
                .dataloggers
                .insert(id.clone(), d)
                .map(EquipmentRecord::Datalogger),
            EquipmentRecord::Response(r) => self
                .responses
                .insert(id.clone(), r)
                .map(EquipmentRecord::Response),
            EquipmentRecord::PoleZero(p) => self
                .pole_zero
                .insert(id.clone(), p)
                .map(EquipmentRecord::PoleZero),
        };
        if previous.is_some() {
            self.duplicates += 1;
            warn!("Duplicate {} publicID '{}', keeping the later definition", kind, id);
        }
        previous
    }

    pub fn sensor(&self, public_id: &str) -> Option<&Sensor> {
        self.sensors.get(public_id)
    }

    pub fn datalogger(&self, public_id: &str) -> Option<&Datalogger> {
        self.dataloggers.get(public_id)
    }

    pub fn response(&self, public_id: &str) -> Option<&Response> {
        self.responses.get(public_id)
    }

    pub fn pole_zero(&self, public_id: &str) -> Option<&PoleZeroResponse> {
        self.pole_zero.get(public_id)
    }

    /// Whether any definition of `kind` carries this `publicID`
    pub fn contains(&self, kind: EquipmentKind, public_id: &str) -> bool {
        match kind {
            EquipmentKind::Sensor => self.sensors.contains_key(public_id),
            EquipmentKind::Datalogger => self.dataloggers.contains_key(public_id),
            EquipmentKind::Response => self.responses.contains_key(public_id),
            EquipmentKind::PoleZero => self.pole_zero.contains_key(public_id),
        }
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            sensors: self.sensors.len(),
            dataloggers: self.dataloggers.len(),
            responses: self.responses.len(),
            pole_zero_responses: self.pole_zero.len(),
            duplicates: self.duplicates,
        }
    }
}
