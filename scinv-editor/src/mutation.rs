//! Field-level mutation of document nodes
//!
//! Every field of a commit is attempted on its own. A value is validated
//! completely before anything is written, so a rejected field keeps its prior
//! state and never ends up half-written.

use scinv_common::{Document, NodeId};
use tracing::{debug, warn};

use crate::error::MutationError;
use crate::fields::{Check, FieldSpec, NodeKind, Target};

const NUMERATOR: &str = "sampleRateNumerator";
const DENOMINATOR: &str = "sampleRateDenominator";

/// What happened to each field of one commit
#[derive(Debug, Default, PartialEq)]
pub struct CommitReport {
    /// Fields whose stored state changed
    pub updated: Vec<&'static str>,
    /// Fields that already held the requested state
    pub unchanged: Vec<&'static str>,
    /// Rejected fields with the reason
    pub failed: Vec<(String, MutationError)>,
}

impl CommitReport {
    /// True when the document was modified
    pub fn changed(&self) -> bool {
        !self.updated.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

fn validate(spec: &FieldSpec, value: &str) -> Result<(), MutationError> {
    let Check::Number { min, max } = spec.check else {
        return Ok(());
    };
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| MutationError::NotANumber {
            field: spec.name,
            value: value.to_string(),
        })?;
    if !parsed.is_finite() {
        return Err(MutationError::NotANumber {
            field: spec.name,
            value: value.to_string(),
        });
    }
    if parsed < min || parsed > max {
        return Err(MutationError::OutOfRange {
            field: spec.name,
            value: parsed,
            min,
            max,
        });
    }
    Ok(())
}

/// Assign or remove an attribute; returns whether the node changed
fn set_attribute(doc: &mut Document, node: NodeId, name: &str, required: bool, value: &str) -> bool {
    if value.is_empty() {
        if required {
            return false;
        }
        return doc.remove_attribute(node, name).is_some();
    }
    if doc.attribute(node, name) == Some(value) {
        return false;
    }
    doc.set_attribute(node, name, value);
    true
}

/// Set or remove a child element's text; returns whether the node changed
///
/// An empty value removes every same-named child.
fn set_element(doc: &mut Document, node: NodeId, name: &str, value: &str) -> bool {
    if value.is_empty() {
        return doc.remove_child(node, name);
    }
    if doc.child_text(node, name).as_deref() == Some(value) {
        return false;
    }
    doc.set_child_text(node, name, value);
    true
}

/// Split a single rate into numerator and denominator `1`
///
/// An empty value leaves the stored pair alone.
fn set_sample_rate(
    doc: &mut Document,
    node: NodeId,
    spec: &FieldSpec,
    value: &str,
) -> Result<bool, MutationError> {
    if value.is_empty() {
        return Ok(false);
    }
    validate(spec, value)?;
    let rate: f64 = value.trim().parse().map_err(|_| MutationError::NotANumber {
        field: spec.name,
        value: value.to_string(),
    })?;
    if rate.fract() != 0.0 {
        return Err(MutationError::NonIntegralRate(rate));
    }
    if rate > f64::from(u32::MAX) {
        return Err(MutationError::OutOfRange {
            field: spec.name,
            value: rate,
            min: 0.0,
            max: f64::from(u32::MAX),
        });
    }
    let numerator = (rate as u32).to_string();
    let numerator_changed = set_element(doc, node, NUMERATOR, &numerator);
    let denominator_changed = set_element(doc, node, DENOMINATOR, "1");
    Ok(numerator_changed || denominator_changed)
}

/// Apply one field to a node of the given kind
///
/// Returns whether the document changed. On error the field is untouched.
pub fn apply_field(
    doc: &mut Document,
    node: NodeId,
    kind: NodeKind,
    field: &str,
    value: &str,
) -> Result<bool, MutationError> {
    let spec = kind.field(field).ok_or_else(|| MutationError::UnknownField {
        kind,
        field: field.to_string(),
    })?;
    apply_spec(doc, node, spec, value)
}

fn apply_spec(
    doc: &mut Document,
    node: NodeId,
    spec: &FieldSpec,
    value: &str,
) -> Result<bool, MutationError> {
    match spec.target {
        Target::Attribute { required } => Ok(set_attribute(doc, node, spec.name, required, value)),
        Target::Element => {
            if !value.is_empty() {
                validate(spec, value)?;
            }
            Ok(set_element(doc, node, spec.name, value))
        }
        Target::SampleRate => set_sample_rate(doc, node, spec, value),
    }
}

/// Apply a set of field values, each independently of the others
pub fn apply_fields<K: AsRef<str>, V: AsRef<str>>(
    doc: &mut Document,
    node: NodeId,
    kind: NodeKind,
    changes: &[(K, V)],
) -> CommitReport {
    let mut report = CommitReport::default();
    for (field, value) in changes {
        let (field, value) = (field.as_ref(), value.as_ref());
        let outcome = match kind.field(field) {
            Some(spec) => apply_spec(doc, node, spec, value).map(|changed| (spec.name, changed)),
            None => Err(MutationError::UnknownField {
                kind,
                field: field.to_string(),
            }),
        };
        match outcome {
            Ok((name, true)) => {
                debug!("{} #{}: {} = '{}'", kind, node.index(), name, value);
                report.updated.push(name);
            }
            Ok((name, false)) => report.unchanged.push(name),
            Err(e) => {
                warn!("Rejected {} field update: {}", kind, e);
                report.failed.push((field.to_string(), e));
            }
        }
    }
    report
}

/// Sample rate derived from the stored numerator and denominator
///
/// Absent when the numerator is missing, either part is not a number, or the
/// denominator is zero. A missing denominator counts as 1.
pub fn sample_rate(doc: &Document, node: NodeId) -> Option<f64> {
    let numerator: f64 = doc
        .child_text(node, NUMERATOR)
        .filter(|t| !t.trim().is_empty())?
        .trim()
        .parse()
        .ok()?;
    let denominator: f64 = match doc.child_text(node, DENOMINATOR) {
        Some(t) if !t.trim().is_empty() => t.trim().parse().ok()?,
        _ => 1.0,
    };
    if denominator == 0.0 {
        return None;
    }
    let rate = numerator / denominator;
    rate.is_finite().then_some(rate)
}

/// Display form of a rate; whole numbers keep one decimal (`100.0`)
pub fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{rate:.1}")
    } else {
        rate.to_string()
    }
}

/// Current value of every field of the node's kind, absent as empty
pub fn read_fields(doc: &Document, node: NodeId, kind: NodeKind) -> Vec<(&'static str, String)> {
    kind.fields()
        .iter()
        .map(|spec| {
            let value = match spec.target {
                Target::Attribute { .. } => doc.attribute(node, spec.name).unwrap_or_default().to_string(),
                Target::Element => doc.child_text(node, spec.name).unwrap_or_default(),
                Target::SampleRate => sample_rate(doc, node).map(format_rate).unwrap_or_default(),
            };
            (spec.name, value)
        })
        .collect()
}
