//! Editable fields per node kind
//!
//! Each field names where its value lives (attribute, child element, or the
//! derived sample rate) and how a new value is checked before it is written.

use std::fmt;

use scinv_common::schema::element;
use scinv_common::{Document, NodeId};

/// Kinds of node that can be edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Station,
    Sensor,
    Datalogger,
    Stream,
}

impl NodeKind {
    /// Kind of an element, by local name
    pub fn of(doc: &Document, node: NodeId) -> Option<Self> {
        match doc.local_name(node) {
            element::STATION => Some(NodeKind::Station),
            element::SENSOR => Some(NodeKind::Sensor),
            element::DATALOGGER => Some(NodeKind::Datalogger),
            element::STREAM => Some(NodeKind::Stream),
            _ => None,
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            NodeKind::Station => STATION_FIELDS,
            NodeKind::Sensor | NodeKind::Datalogger => EQUIPMENT_FIELDS,
            NodeKind::Stream => STREAM_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Station => "station",
            NodeKind::Sensor => "sensor",
            NodeKind::Datalogger => "datalogger",
            NodeKind::Stream => "stream",
        };
        f.write_str(name)
    }
}

/// Where a field's value is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Node attribute; a required attribute is never removed
    Attribute { required: bool },
    /// Text of a direct child element, removed when emptied
    Element,
    /// `sampleRateNumerator` / `sampleRateDenominator` pair
    SampleRate,
}

/// Validation applied to a non-empty value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Check {
    Text,
    Number { min: f64, max: f64 },
}

const ANY: Check = Check::Number {
    min: f64::NEG_INFINITY,
    max: f64::INFINITY,
};

const NON_NEGATIVE: Check = Check::Number {
    min: 0.0,
    max: f64::INFINITY,
};

/// One editable field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub target: Target,
    pub check: Check,
}

const fn attribute(name: &'static str, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        target: Target::Attribute { required },
        check: Check::Text,
    }
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        target: Target::Element,
        check: Check::Text,
    }
}

const fn number(name: &'static str, check: Check) -> FieldSpec {
    FieldSpec {
        name,
        target: Target::Element,
        check,
    }
}

/// Name of the derived sample rate field
pub const SAMPLE_RATE: &str = "sampleRate";

pub const STATION_FIELDS: &[FieldSpec] = &[
    attribute("code", true),
    attribute("name", false),
    text("description"),
    number("latitude", Check::Number { min: -90.0, max: 90.0 }),
    number("longitude", Check::Number { min: -180.0, max: 180.0 }),
    number("elevation", ANY),
];

pub const EQUIPMENT_FIELDS: &[FieldSpec] = &[
    attribute("name", false),
    text("type"),
    text("model"),
    text("manufacturer"),
    text("serialNumber"),
];

pub const STREAM_FIELDS: &[FieldSpec] = &[
    attribute("code", true),
    text("start"),
    text("end"),
    number("depth", ANY),
    number("azimuth", Check::Number { min: 0.0, max: 360.0 }),
    number("dip", Check::Number { min: -90.0, max: 90.0 }),
    number("gain", ANY),
    FieldSpec {
        name: SAMPLE_RATE,
        target: Target::SampleRate,
        check: NON_NEGATIVE,
    },
    number("gainFrequency", NON_NEGATIVE),
    text("gainUnit"),
    text("dataloggerSerialNumber"),
    text("sensorSerialNumber"),
    text("flags"),
];
