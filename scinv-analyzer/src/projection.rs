//! Flattening of resolved records into one row per stream
//!
//! Every absent value projects to the empty string. Column groups tied to
//! optional data (sensor, datalogger, decimation, comments) only appear when
//! at least one record carries them. The coalesced serial numbers are always
//! the last two columns.

use crate::record::StreamRecord;

const CONTEXT_COLUMNS: &[&str] = &[
    "network",
    "network_start",
    "network_end",
    "station",
    "station_start",
    "station_end",
    "location",
    "latitude",
    "longitude",
    "elevation",
];

const STREAM_COLUMNS: &[&str] = &[
    "channel",
    "stream_start",
    "stream_end",
    "depth",
    "azimuth",
    "dip",
    "gain",
    "gainFrequency",
    "gainUnit",
    "format",
    "flags",
    "restricted",
    "shared",
    "sensorChannel",
    "dataloggerChannel",
    "clockSerialNumber",
    "sampleRateNumerator",
    "sampleRateDenominator",
    "clockDrift",
    "clockModel",
];

const SENSOR_COLUMNS: &[&str] = &[
    "sensor_name",
    "sensor_description",
    "sensor_manufacturer",
    "sensor_model",
    "sensor_type",
    "sensor_unit",
    "sensor_response",
    "sensor_remark",
];

const DATALOGGER_COLUMNS: &[&str] = &[
    "datalogger_name",
    "datalogger_description",
    "datalogger_manufacturer",
    "datalogger_model",
    "datalogger_type",
    "datalogger_remark",
];

const SERIAL_COLUMNS: &[&str] = &["sensor_serial_number", "datalogger_serial_number"];

/// Rectangular projection of a resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == name)
    }

    /// Value of `column` in row `row`
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn shown<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn context_cells(rec: &StreamRecord) -> Vec<String> {
    let c = &rec.context;
    vec![
        c.network.clone(),
        text(&c.network_start),
        text(&c.network_end),
        c.station.clone(),
        text(&c.station_start),
        text(&c.station_end),
        c.location.clone(),
        shown(&c.latitude),
        shown(&c.longitude),
        shown(&c.elevation),
    ]
}

fn stream_cells(rec: &StreamRecord) -> Vec<String> {
    let s = &rec.stream;
    vec![
        s.channel.clone(),
        text(&s.start),
        text(&s.end),
        shown(&s.depth),
        shown(&s.azimuth),
        shown(&s.dip),
        shown(&s.gain),
        shown(&s.gain_frequency),
        text(&s.gain_unit),
        text(&s.format),
        text(&s.flags),
        shown(&s.restricted),
        shown(&s.shared),
        shown(&s.sensor_channel),
        shown(&s.datalogger_channel),
        text(&s.clock_serial_number),
        shown(&s.sample_rate_numerator),
        shown(&s.sample_rate_denominator),
        shown(&s.clock_drift),
        text(&s.clock_model),
    ]
}

fn sensor_cells(rec: &StreamRecord) -> Vec<String> {
    match &rec.sensor {
        Some(s) => vec![
            text(&s.name),
            text(&s.description),
            text(&s.manufacturer),
            text(&s.model),
            text(&s.sensor_type),
            text(&s.unit),
            text(&s.response),
            text(&s.remark),
        ],
        None => vec![String::new(); SENSOR_COLUMNS.len()],
    }
}

fn datalogger_cells(rec: &StreamRecord) -> Vec<String> {
    match &rec.datalogger {
        Some(d) => vec![
            text(&d.name),
            text(&d.description),
            text(&d.manufacturer),
            text(&d.model),
            text(&d.datalogger_type),
            text(&d.remark),
        ],
        None => vec![String::new(); DATALOGGER_COLUMNS.len()],
    }
}

/// Project records into a table, preserving their order
pub fn project(records: &[StreamRecord]) -> Table {
    if records.is_empty() {
        return Table::default();
    }

    let with_sensor = records.iter().any(|r| r.sensor.is_some());
    let with_datalogger = records.iter().any(|r| r.datalogger.is_some());
    let with_decimation = records.iter().any(|r| r.decimation_info.is_some());
    let with_comments = records.iter().any(|r| r.comments.is_some());

    let mut columns: Vec<&'static str> = Vec::new();
    columns.extend(CONTEXT_COLUMNS);
    columns.extend(STREAM_COLUMNS);
    if with_sensor {
        columns.extend(SENSOR_COLUMNS);
    }
    if with_datalogger {
        columns.extend(DATALOGGER_COLUMNS);
    }
    if with_decimation {
        columns.push("decimation_info");
    }
    if with_comments {
        columns.push("stream_comments");
    }
    columns.extend(SERIAL_COLUMNS);

    let rows = records
        .iter()
        .map(|rec| {
            let mut row = context_cells(rec);
            row.extend(stream_cells(rec));
            if with_sensor {
                row.extend(sensor_cells(rec));
            }
            if with_datalogger {
                row.extend(datalogger_cells(rec));
            }
            if with_decimation {
                row.push(text(&rec.decimation_info));
            }
            if with_comments {
                row.push(text(&rec.comments));
            }
            row.push(rec.sensor_serial_number().unwrap_or_default().to_string());
            row.push(rec.datalogger_serial_number().unwrap_or_default().to_string());
            row
        })
        .collect();

    Table { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::{DataloggerFields, Sensor};
    use crate::record::{Parsed, StreamContext, StreamFields};

    fn bare(channel: &str) -> StreamRecord {
        StreamRecord {
            context: StreamContext {
                network: "GE".into(),
                station: "WLF".into(),
                latitude: Some(Parsed::new(49.66, "49.66")),
                ..Default::default()
            },
            stream: StreamFields {
                channel: channel.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        let table = project(&[]);
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_optional_groups_absent_without_data() {
        let table = project(&[bare("BHZ")]);
        assert_eq!(
            table.columns.len(),
            CONTEXT_COLUMNS.len() + STREAM_COLUMNS.len() + SERIAL_COLUMNS.len()
        );
        assert!(table.column_index("sensor_name").is_none());
        assert!(table.column_index("stream_comments").is_none());
        assert_eq!(table.cell(0, "latitude"), Some("49.66"));
        assert_eq!(table.cell(0, "depth"), Some(""));
    }

    #[test]
    fn test_rows_are_rectangular_when_groups_mix() {
        let mut with_sensor = bare("BHZ");
        with_sensor.sensor = Some(Sensor {
            public_id: "S1".into(),
            name: Some("STS-2".into()),
            ..Default::default()
        });
        with_sensor.comments = Some("note".into());
        let mut with_logger = bare("BHN");
        with_logger.datalogger = Some(DataloggerFields {
            public_id: "D1".into(),
            serial_number: Some("DL-7".into()),
            ..Default::default()
        });

        let table = project(&[with_sensor, with_logger]);
        assert!(table.rows.iter().all(|r| r.len() == table.columns.len()));
        assert_eq!(table.cell(0, "sensor_name"), Some("STS-2"));
        assert_eq!(table.cell(1, "sensor_name"), Some(""));
        assert_eq!(table.cell(1, "stream_comments"), Some(""));
        assert_eq!(table.cell(1, "datalogger_serial_number"), Some("DL-7"));
    }

    #[test]
    fn test_serial_columns_are_last_and_source_fields_dropped() {
        let table = project(&[bare("BHZ")]);
        let n = table.columns.len();
        assert_eq!(&table.columns[n - 2..], SERIAL_COLUMNS);
        assert!(table.column_index("sensorSerialNumber").is_none());
        assert!(table.column_index("sensor_serial_number_stream").is_none());
    }
}
