//! Network → station → location → stream traversal
//!
//! Networks, stations and locations are looked up as descendants of their
//! parent, streams as direct children of a location. Each level copies its
//! own attributes into the context handed down; nothing points back up.

use scinv_common::schema::{attr, element};
use scinv_common::{Document, NodeId, Result};

/// Attributes a stream inherits from its ancestors, as written in the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyContext {
    pub network: String,
    pub network_start: Option<String>,
    pub network_end: Option<String>,
    pub station: String,
    pub station_start: Option<String>,
    pub station_end: Option<String>,
    pub location: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub elevation: Option<String>,
}

fn code(doc: &Document, node: NodeId) -> String {
    doc.attribute(node, attr::CODE).unwrap_or_default().to_string()
}

/// Lazily enumerate every stream with its inherited context, in document order
///
/// Fails only when the document has no `Inventory`; empty levels simply
/// yield nothing.
pub fn walk(doc: &Document) -> Result<impl Iterator<Item = (HierarchyContext, NodeId)> + '_> {
    let inventory = doc.inventory()?;

    let streams = doc
        .descendants_named(inventory, element::NETWORK)
        .flat_map(move |network| {
            let network_ctx = HierarchyContext {
                network: code(doc, network),
                network_start: doc.child_text(network, "start"),
                network_end: doc.child_text(network, "end"),
                ..Default::default()
            };
            doc.descendants_named(network, element::STATION)
                .flat_map(move |station| {
                    let station_ctx = HierarchyContext {
                        station: code(doc, station),
                        station_start: doc.child_text(station, "start"),
                        station_end: doc.child_text(station, "end"),
                        ..network_ctx.clone()
                    };
                    doc.descendants_named(station, element::SENSOR_LOCATION)
                        .flat_map(move |location| {
                            let ctx = HierarchyContext {
                                location: code(doc, location),
                                latitude: doc.child_text(location, "latitude"),
                                longitude: doc.child_text(location, "longitude"),
                                elevation: doc.child_text(location, "elevation"),
                                ..station_ctx.clone()
                            };
                            doc.children_named(location, element::STREAM)
                                .map(move |stream| (ctx.clone(), stream))
                        })
                })
        });

    Ok(streams)
}
