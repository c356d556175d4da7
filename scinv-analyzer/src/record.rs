//! Resolved, denormalized stream records

use std::fmt;

use crate::equipment::{DataloggerFields, Sensor};

/// A value parsed from element text, keeping the text as written
///
/// Displays as the (trimmed) source text, so `1.5E9` stays `1.5E9` in the
/// projected table.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    value: T,
    text: String,
}

impl<T> Parsed<T> {
    pub fn new(value: T, text: impl Into<String>) -> Self {
        Self {
            value,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl<T: Copy> Parsed<T> {
    pub fn value(&self) -> T {
        self.value
    }
}

impl<T> fmt::Display for Parsed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Inherited context with the location's coordinates validated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamContext {
    pub network: String,
    pub network_start: Option<String>,
    pub network_end: Option<String>,
    pub station: String,
    pub station_start: Option<String>,
    pub station_end: Option<String>,
    pub location: String,
    pub latitude: Option<Parsed<f64>>,
    pub longitude: Option<Parsed<f64>>,
    pub elevation: Option<Parsed<f64>>,
}

/// Fields read from the `<stream>` element itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamFields {
    pub channel: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub depth: Option<Parsed<f64>>,
    pub azimuth: Option<Parsed<f64>>,
    pub dip: Option<Parsed<f64>>,
    pub gain: Option<Parsed<f64>>,
    pub gain_frequency: Option<Parsed<f64>>,
    pub gain_unit: Option<String>,
    pub format: Option<String>,
    pub flags: Option<String>,
    pub restricted: Option<Parsed<bool>>,
    pub shared: Option<Parsed<bool>>,
    pub sensor_serial_number: Option<String>,
    pub datalogger_serial_number: Option<String>,
    pub sensor_channel: Option<Parsed<u32>>,
    pub datalogger_channel: Option<Parsed<u32>>,
    pub clock_serial_number: Option<String>,
    pub sample_rate_numerator: Option<Parsed<u32>>,
    pub sample_rate_denominator: Option<Parsed<u32>>,
    pub clock_drift: Option<Parsed<f64>>,
    pub clock_model: Option<String>,
}

/// One resolved stream
///
/// Stream-level and equipment-level serial numbers stay separate here; use
/// [`StreamRecord::sensor_serial_number`] and
/// [`StreamRecord::datalogger_serial_number`] for the effective values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamRecord {
    pub context: StreamContext,
    pub stream: StreamFields,
    pub sensor: Option<Sensor>,
    pub datalogger: Option<DataloggerFields>,
    /// JSON-encoded decimation stages of the datalogger, when it has any
    pub decimation_info: Option<String>,
    /// Non-empty comment texts joined with `"; "`
    pub comments: Option<String>,
}

fn coalesce<'a>(stream: Option<&'a str>, equipment: Option<&'a str>) -> Option<&'a str> {
    stream
        .filter(|s| !s.trim().is_empty())
        .or(equipment.filter(|s| !s.trim().is_empty()))
}

impl StreamRecord {
    /// `NET.STA.LOC.CHA` identifier of the stream
    pub fn path(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.context.network, self.context.station, self.context.location, self.stream.channel
        )
    }

    /// Stream-level serial number if non-empty, else the sensor's
    pub fn sensor_serial_number(&self) -> Option<&str> {
        coalesce(
            self.stream.sensor_serial_number.as_deref(),
            self.sensor.as_ref().and_then(|s| s.serial_number.as_deref()),
        )
    }

    /// Stream-level serial number if non-empty, else the datalogger's
    pub fn datalogger_serial_number(&self) -> Option<&str> {
        coalesce(
            self.stream.datalogger_serial_number.as_deref(),
            self.datalogger
                .as_ref()
                .and_then(|d| d.serial_number.as_deref()),
        )
    }
}
