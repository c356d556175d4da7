//! Stream resolution
//!
//! Each stream is resolved on its own: its local fields, the context carried
//! down by the walker and the sensor/datalogger it references are merged into
//! one [`StreamRecord`]. A stream that cannot be resolved is reported in the
//! pass result and skipped; it never stops the rest of the pass.

use std::str::FromStr;

use rayon::prelude::*;
use scinv_common::schema::{attr, element};
use scinv_common::{Document, NodeId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::equipment::{encode_decimations, EquipmentKind};
use crate::error::Result;
use crate::index::IdentifierIndex;
use crate::record::{Parsed, StreamContext, StreamFields, StreamRecord};
use crate::walker::{walk, HierarchyContext};

/// Why a single field could not be merged
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("{field} is not {expected}: '{value}'")]
    Malformed {
        field: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("decimation stages could not be encoded: {0}")]
    Decimation(#[from] serde_json::Error),
}

/// A stream that was skipped
#[derive(Debug, Error)]
#[error("stream #{position} ({path}): {reason}")]
pub struct ResolutionError {
    /// 1-based ordinal of the stream in document order
    pub position: usize,
    /// `NET.STA.LOC.CHA` of the stream
    pub path: String,
    pub reason: FieldError,
}

/// A stream reference that matched no equipment definition
///
/// Not an error: the equipment columns of that stream stay empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMiss {
    pub path: String,
    pub kind: EquipmentKind,
    pub reference: String,
}

/// Result of one stream
#[derive(Debug)]
pub struct Resolved {
    pub record: StreamRecord,
    pub misses: Vec<ReferenceMiss>,
}

/// Outcome of resolving every stream of a document
#[derive(Debug, Default)]
pub struct ResolutionPass {
    pub records: Vec<StreamRecord>,
    pub failures: Vec<ResolutionError>,
    pub reference_misses: Vec<ReferenceMiss>,
}

impl ResolutionPass {
    /// Number of streams visited, resolved or not
    pub fn streams_seen(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    fn absorb(&mut self, outcome: std::result::Result<Resolved, ResolutionError>) {
        match outcome {
            Ok(resolved) => {
                for miss in &resolved.misses {
                    debug!(
                        "{}: {} reference '{}' not found",
                        miss.path, miss.kind, miss.reference
                    );
                }
                self.reference_misses.extend(resolved.misses);
                self.records.push(resolved.record);
            }
            Err(e) => {
                warn!("Skipping {}", e);
                self.failures.push(e);
            }
        }
    }
}

/// Text of a child, with blank treated as absent
fn text(doc: &Document, node: NodeId, name: &str) -> Option<String> {
    doc.child_text(node, name).filter(|t| !t.trim().is_empty())
}

fn parse<T: FromStr>(
    raw: Option<String>,
    field: &'static str,
    expected: &'static str,
) -> std::result::Result<Option<Parsed<T>>, FieldError> {
    let Some(value) = raw else {
        return Ok(None);
    };
    let trimmed = value.trim();
    match trimmed.parse() {
        Ok(parsed) => Ok(Some(Parsed::new(parsed, trimmed))),
        Err(_) => Err(FieldError::Malformed {
            field,
            expected,
            value,
        }),
    }
}

/// Finite floating-point value; `NaN` and `inf` are malformed
fn finite(
    raw: Option<String>,
    field: &'static str,
) -> std::result::Result<Option<Parsed<f64>>, FieldError> {
    match parse::<f64>(raw, field, "a number")? {
        Some(parsed) if !parsed.value().is_finite() => Err(FieldError::Malformed {
            field,
            expected: "a finite number",
            value: parsed.text().to_string(),
        }),
        other => Ok(other),
    }
}

fn number(
    doc: &Document,
    node: NodeId,
    field: &'static str,
) -> std::result::Result<Option<Parsed<f64>>, FieldError> {
    finite(text(doc, node, field), field)
}

fn count(
    doc: &Document,
    node: NodeId,
    field: &'static str,
) -> std::result::Result<Option<Parsed<u32>>, FieldError> {
    parse(text(doc, node, field), field, "a non-negative integer")
}

fn flag(
    doc: &Document,
    node: NodeId,
    field: &'static str,
) -> std::result::Result<Option<Parsed<bool>>, FieldError> {
    let Some(value) = text(doc, node, field) else {
        return Ok(None);
    };
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(Some(Parsed::new(true, trimmed))),
        "false" | "0" => Ok(Some(Parsed::new(false, trimmed))),
        _ => Err(FieldError::Malformed {
            field,
            expected: "a boolean",
            value,
        }),
    }
}

/// Location coordinate, blank treated as absent
fn coordinate(
    raw: Option<String>,
    field: &'static str,
) -> std::result::Result<Option<Parsed<f64>>, FieldError> {
    finite(raw.filter(|t| !t.trim().is_empty()), field)
}

fn context(ctx: HierarchyContext) -> std::result::Result<StreamContext, FieldError> {
    Ok(StreamContext {
        latitude: coordinate(ctx.latitude, "latitude")?,
        longitude: coordinate(ctx.longitude, "longitude")?,
        elevation: coordinate(ctx.elevation, "elevation")?,
        network: ctx.network,
        network_start: ctx.network_start,
        network_end: ctx.network_end,
        station: ctx.station,
        station_start: ctx.station_start,
        station_end: ctx.station_end,
        location: ctx.location,
    })
}

fn stream_fields(doc: &Document, stream: NodeId) -> std::result::Result<StreamFields, FieldError> {
    Ok(StreamFields {
        channel: doc.attribute(stream, attr::CODE).unwrap_or_default().to_string(),
        start: text(doc, stream, "start"),
        end: text(doc, stream, "end"),
        depth: number(doc, stream, "depth")?,
        azimuth: number(doc, stream, "azimuth")?,
        dip: number(doc, stream, "dip")?,
        gain: number(doc, stream, "gain")?,
        gain_frequency: number(doc, stream, "gainFrequency")?,
        gain_unit: text(doc, stream, "gainUnit"),
        format: text(doc, stream, "format"),
        flags: text(doc, stream, "flags"),
        restricted: flag(doc, stream, "restricted")?,
        shared: flag(doc, stream, "shared")?,
        sensor_serial_number: doc.child_text(stream, "sensorSerialNumber"),
        datalogger_serial_number: doc.child_text(stream, "dataloggerSerialNumber"),
        sensor_channel: count(doc, stream, "sensorChannel")?,
        datalogger_channel: count(doc, stream, "dataloggerChannel")?,
        clock_serial_number: text(doc, stream, "clockSerialNumber"),
        sample_rate_numerator: count(doc, stream, "sampleRateNumerator")?,
        sample_rate_denominator: count(doc, stream, "sampleRateDenominator")?,
        clock_drift: number(doc, stream, "clockDrift")?,
        clock_model: text(doc, stream, "clockModel"),
    })
}

fn comments(doc: &Document, stream: NodeId) -> Option<String> {
    let texts: Vec<String> = doc
        .descendants_named(stream, element::COMMENT)
        .filter_map(|comment| doc.child_text(comment, element::COMMENT_TEXT))
        .filter(|t| !t.trim().is_empty())
        .collect();
    (!texts.is_empty()).then(|| texts.join("; "))
}

/// Non-empty reference attribute of a stream
fn reference<'a>(doc: &'a Document, stream: NodeId, name: &str) -> Option<&'a str> {
    doc.attribute(stream, name).filter(|r| !r.is_empty())
}

/// Resolve one stream against the index
///
/// `position` is the 1-based ordinal used when reporting a failure.
pub fn resolve_stream(
    doc: &Document,
    index: &IdentifierIndex,
    ctx: HierarchyContext,
    stream: NodeId,
    position: usize,
) -> std::result::Result<Resolved, ResolutionError> {
    let path = format!(
        "{}.{}.{}.{}",
        ctx.network,
        ctx.station,
        ctx.location,
        doc.attribute(stream, attr::CODE).unwrap_or_default()
    );
    let fail = |reason: FieldError| ResolutionError {
        position,
        path: path.clone(),
        reason,
    };

    let context = context(ctx).map_err(fail)?;
    let fields = stream_fields(doc, stream).map_err(fail)?;
    let mut record = StreamRecord {
        context,
        stream: fields,
        ..Default::default()
    };
    let mut misses = Vec::new();

    if let Some(sensor_ref) = reference(doc, stream, attr::SENSOR) {
        match index.sensor(sensor_ref) {
            Some(sensor) => record.sensor = Some(sensor.clone()),
            None => misses.push(ReferenceMiss {
                path: path.clone(),
                kind: EquipmentKind::Sensor,
                reference: sensor_ref.to_string(),
            }),
        }
    }

    if let Some(datalogger_ref) = reference(doc, stream, attr::DATALOGGER) {
        match index.datalogger(datalogger_ref) {
            Some(datalogger) => {
                record.datalogger = Some(datalogger.fields.clone());
                if !datalogger.decimations.is_empty() {
                    let encoded = encode_decimations(&datalogger.decimations)
                        .map_err(|e| fail(e.into()))?;
                    record.decimation_info = Some(encoded);
                }
            }
            None => misses.push(ReferenceMiss {
                path: path.clone(),
                kind: EquipmentKind::Datalogger,
                reference: datalogger_ref.to_string(),
            }),
        }
    }

    record.comments = comments(doc, stream);
    Ok(Resolved { record, misses })
}

/// Resolve every stream of the document in walk order
pub fn resolve_all(doc: &Document, index: &IdentifierIndex) -> Result<ResolutionPass> {
    let mut pass = ResolutionPass::default();
    for (i, (ctx, stream)) in walk(doc)?.enumerate() {
        pass.absorb(resolve_stream(doc, index, ctx, stream, i + 1));
    }
    log_summary(&pass);
    Ok(pass)
}

/// Same as [`resolve_all`], spreading streams over the rayon pool
///
/// The index is only read; output order matches the sequential pass.
pub fn resolve_all_parallel(doc: &Document, index: &IdentifierIndex) -> Result<ResolutionPass> {
    let pairs: Vec<(HierarchyContext, NodeId)> = walk(doc)?.collect();
    let outcomes: Vec<_> = pairs
        .into_par_iter()
        .enumerate()
        .map(|(i, (ctx, stream))| resolve_stream(doc, index, ctx, stream, i + 1))
        .collect();

    let mut pass = ResolutionPass::default();
    for outcome in outcomes {
        pass.absorb(outcome);
    }
    log_summary(&pass);
    Ok(pass)
}

fn log_summary(pass: &ResolutionPass) {
    info!(
        "Resolved {} of {} streams ({} skipped, {} unresolved references)",
        pass.records.len(),
        pass.streams_seen(),
        pass.failures.len(),
        pass.reference_misses.len()
    );
}
