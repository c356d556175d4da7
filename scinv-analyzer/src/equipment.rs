//! Equipment records decoded from the shared inventory definitions
//!
//! Sensors, dataloggers, responses and pole-zero responses are declared once
//! under `Inventory` and referenced by `publicID` from streams. Every
//! descriptive field is optional: `None` means the element or attribute is
//! absent, `Some("")` means it is present but blank.

use scinv_common::schema::{attr, element};
use scinv_common::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared sensor definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sensor {
    pub public_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sensor_type: Option<String>,
    pub unit: Option<String>,
    /// `publicID` of the sensor's response, as written on the sensor
    pub response: Option<String>,
    pub remark: Option<String>,
    pub serial_number: Option<String>,
}

/// Descriptive datalogger fields, merged into resolved streams
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataloggerFields {
    pub public_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub datalogger_type: Option<String>,
    pub remark: Option<String>,
    pub serial_number: Option<String>,
}

/// Shared datalogger definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datalogger {
    pub fields: DataloggerFields,
    /// Decimation stages in document order; empty means no stages
    pub decimations: Vec<Decimation>,
}

/// One sample-rate reduction step of a datalogger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decimation {
    #[serde(default)]
    pub sample_rate_numerator: Option<String>,
    #[serde(default)]
    pub sample_rate_denominator: Option<String>,
    #[serde(default)]
    pub analogue_filter_chain: Option<String>,
    #[serde(default)]
    pub digital_filter_chain: Option<String>,
}

/// Generic response curve definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub public_id: String,
    pub name: Option<String>,
    pub gain: Option<String>,
    pub frequency: Option<String>,
    pub gain_frequency: Option<String>,
}

/// Pole-zero response definition (`responsePAZ`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoleZeroResponse {
    pub public_id: String,
    pub name: Option<String>,
    pub paz_type: Option<String>,
    pub gain: Option<String>,
    pub gain_frequency: Option<String>,
    pub normalization_factor: Option<String>,
    pub normalization_frequency: Option<String>,
    pub number_of_poles: Option<String>,
    pub number_of_zeros: Option<String>,
}

/// Equipment record of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum EquipmentRecord {
    Sensor(Sensor),
    Datalogger(Datalogger),
    Response(Response),
    PoleZero(PoleZeroResponse),
}

/// Discriminant of [`EquipmentRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentKind {
    Sensor,
    Datalogger,
    Response,
    PoleZero,
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EquipmentKind::Sensor => "sensor",
            EquipmentKind::Datalogger => "datalogger",
            EquipmentKind::Response => "response",
            EquipmentKind::PoleZero => "responsePAZ",
        };
        f.write_str(name)
    }
}

impl EquipmentRecord {
    pub fn public_id(&self) -> &str {
        match self {
            EquipmentRecord::Sensor(s) => &s.public_id,
            EquipmentRecord::Datalogger(d) => &d.fields.public_id,
            EquipmentRecord::Response(r) => &r.public_id,
            EquipmentRecord::PoleZero(p) => &p.public_id,
        }
    }

    pub fn kind(&self) -> EquipmentKind {
        match self {
            EquipmentRecord::Sensor(_) => EquipmentKind::Sensor,
            EquipmentRecord::Datalogger(_) => EquipmentKind::Datalogger,
            EquipmentRecord::Response(_) => EquipmentKind::Response,
            EquipmentRecord::PoleZero(_) => EquipmentKind::PoleZero,
        }
    }

    /// Decode an equipment element
    ///
    /// Returns `None` for elements of other kinds and for definitions without
    /// a `publicID`, which no stream can reference.
    pub fn decode(doc: &Document, node: NodeId) -> Option<Self> {
        let public_id = doc.attribute(node, attr::PUBLIC_ID)?.to_string();
        let attribute = |name: &str| doc.attribute(node, name).map(str::to_string);
        let text = |name: &str| doc.child_text(node, name);

        let record = match doc.local_name(node) {
            element::SENSOR => EquipmentRecord::Sensor(Sensor {
                public_id,
                name: attribute(attr::NAME),
                description: text("description"),
                manufacturer: text("manufacturer"),
                model: text("model"),
                sensor_type: text("type"),
                unit: text("unit"),
                response: attribute(attr::RESPONSE),
                remark: text("remark"),
                serial_number: text("serialNumber"),
            }),
            element::DATALOGGER => EquipmentRecord::Datalogger(Datalogger {
                fields: DataloggerFields {
                    public_id,
                    name: attribute(attr::NAME),
                    description: text("description"),
                    manufacturer: text("manufacturer"),
                    model: text("model"),
                    datalogger_type: text("type"),
                    remark: text("remark"),
                    serial_number: text("serialNumber"),
                },
                decimations: doc
                    .descendants_named(node, element::DECIMATION)
                    .map(|stage| Decimation::decode(doc, stage))
                    .collect(),
            }),
            element::RESPONSE => EquipmentRecord::Response(Response {
                public_id,
                name: attribute(attr::NAME),
                gain: text("gain"),
                frequency: text("frequency"),
                gain_frequency: text("gainFrequency"),
            }),
            element::RESPONSE_PAZ => EquipmentRecord::PoleZero(PoleZeroResponse {
                public_id,
                name: attribute(attr::NAME),
                paz_type: text("type"),
                gain: text("gain"),
                gain_frequency: text("gainFrequency"),
                normalization_factor: text("normalizationFactor"),
                normalization_frequency: text("normalizationFrequency"),
                number_of_poles: text("numberOfPoles"),
                number_of_zeros: text("numberOfZeros"),
            }),
            _ => return None,
        };
        Some(record)
    }
}

impl Decimation {
    /// Stage values come from child elements, falling back to attributes
    fn decode(doc: &Document, node: NodeId) -> Self {
        let value = |name: &str| {
            doc.child_text(node, name)
                .or_else(|| doc.attribute(node, name).map(str::to_string))
        };
        Self {
            sample_rate_numerator: value("sampleRateNumerator"),
            sample_rate_denominator: value("sampleRateDenominator"),
            analogue_filter_chain: value("analogueFilterChain"),
            digital_filter_chain: value("digitalFilterChain"),
        }
    }
}

/// Serialise decimation stages to the JSON side-field carried on stream records
pub fn encode_decimations(stages: &[Decimation]) -> serde_json::Result<String> {
    serde_json::to_string(stages)
}

/// Parse the JSON side-field back into decimation stages
pub fn decode_decimations(encoded: &str) -> serde_json::Result<Vec<Decimation>> {
    serde_json::from_str(encoded)
}
