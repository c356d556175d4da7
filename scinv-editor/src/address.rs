//! Textual node addresses and the document outline
//!
//! Addresses:
//! - `NET.STA`: station
//! - `NET.STA.LOC.CHA`: stream (empty location code allowed, `GE.WLF..BHZ`)
//! - `sensor:<publicID>`, `datalogger:<publicID>`: equipment
//!
//! Stations and streams may repeat with different epochs; `#N` selects the
//! N-th match in document order (`GE.WLF..BHZ#2`).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use scinv_common::schema::{attr, element};
use scinv_common::{Document, Error, NodeId, Result};

use crate::fields::NodeKind;

/// Parsed node address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Station {
        network: String,
        station: String,
        occurrence: usize,
    },
    Stream {
        network: String,
        station: String,
        location: String,
        channel: String,
        occurrence: usize,
    },
    Sensor(String),
    Datalogger(String),
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(id) = s.strip_prefix("sensor:") {
            return Ok(Address::Sensor(id.to_string()));
        }
        if let Some(id) = s.strip_prefix("datalogger:") {
            return Ok(Address::Datalogger(id.to_string()));
        }

        let (codes, occurrence) = match s.rsplit_once('#') {
            Some((codes, n)) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => (codes, n),
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "invalid occurrence '#{n}' in address '{s}'"
                    )))
                }
            },
            None => (s, 1),
        };

        let parts: Vec<&str> = codes.split('.').collect();
        match parts.as_slice() {
            [network, station] => Ok(Address::Station {
                network: network.to_string(),
                station: station.to_string(),
                occurrence,
            }),
            [network, station, location, channel] => Ok(Address::Stream {
                network: network.to_string(),
                station: station.to_string(),
                location: location.to_string(),
                channel: channel.to_string(),
                occurrence,
            }),
            _ => Err(Error::InvalidInput(format!(
                "address '{s}' is neither NET.STA, NET.STA.LOC.CHA, sensor:<id> nor datalogger:<id>"
            ))),
        }
    }
}

fn with_occurrence(f: &mut fmt::Formatter<'_>, occurrence: usize) -> fmt::Result {
    if occurrence > 1 {
        write!(f, "#{occurrence}")?;
    }
    Ok(())
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Station {
                network,
                station,
                occurrence,
            } => {
                write!(f, "{network}.{station}")?;
                with_occurrence(f, *occurrence)
            }
            Address::Stream {
                network,
                station,
                location,
                channel,
                occurrence,
            } => {
                write!(f, "{network}.{station}.{location}.{channel}")?;
                with_occurrence(f, *occurrence)
            }
            Address::Sensor(id) => write!(f, "sensor:{id}"),
            Address::Datalogger(id) => write!(f, "datalogger:{id}"),
        }
    }
}

fn has_code(doc: &Document, node: NodeId, code: &str) -> bool {
    doc.attribute(node, attr::CODE).unwrap_or_default() == code
}

fn stations<'a>(
    doc: &'a Document,
    inventory: NodeId,
    network: &'a str,
    station: &'a str,
) -> impl Iterator<Item = NodeId> + 'a {
    doc.descendants_named(inventory, element::NETWORK)
        .filter(move |n| has_code(doc, *n, network))
        .flat_map(move |n| doc.descendants_named(n, element::STATION))
        .filter(move |s| has_code(doc, *s, station))
}

/// Find the node an address refers to
pub fn locate(doc: &Document, address: &Address) -> Result<(NodeId, NodeKind)> {
    let inventory = doc.inventory()?;
    let found = match address {
        Address::Station {
            network,
            station,
            occurrence,
        } => stations(doc, inventory, network, station)
            .nth(occurrence.saturating_sub(1))
            .map(|node| (node, NodeKind::Station)),
        Address::Stream {
            network,
            station,
            location,
            channel,
            occurrence,
        } => stations(doc, inventory, network, station)
            .flat_map(|s| doc.descendants_named(s, element::SENSOR_LOCATION))
            .filter(|l| has_code(doc, *l, location))
            .flat_map(|l| doc.children_named(l, element::STREAM))
            .filter(|c| has_code(doc, *c, channel))
            .nth(occurrence.saturating_sub(1))
            .map(|node| (node, NodeKind::Stream)),
        Address::Sensor(id) => doc
            .descendants_named(inventory, element::SENSOR)
            .find(|n| doc.attribute(*n, attr::PUBLIC_ID) == Some(id.as_str()))
            .map(|node| (node, NodeKind::Sensor)),
        Address::Datalogger(id) => doc
            .descendants_named(inventory, element::DATALOGGER)
            .find(|n| doc.attribute(*n, attr::PUBLIC_ID) == Some(id.as_str()))
            .map(|node| (node, NodeKind::Datalogger)),
    };
    found.ok_or_else(|| Error::NotFound(format!("no node at address '{address}'")))
}

/// One line of the outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub depth: usize,
    pub label: String,
    /// Address for editable entries
    pub address: Option<Address>,
}

impl fmt::Display for OutlineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.label, indent = self.depth * 2)?;
        if let Some(address) = &self.address {
            write!(f, "  [{address}]")?;
        }
        Ok(())
    }
}

fn entry(depth: usize, label: String, address: Option<Address>) -> OutlineEntry {
    OutlineEntry {
        depth,
        label,
        address,
    }
}

fn bump(seen: &mut HashMap<String, usize>, key: String) -> usize {
    let n = seen.entry(key).or_insert(0);
    *n += 1;
    *n
}

/// Network tree followed by the sensor and datalogger lists
///
/// Occurrence numbers in the addresses resolve back to the same node through
/// [`locate`].
pub fn outline(doc: &Document) -> Result<Vec<OutlineEntry>> {
    let inventory = doc.inventory()?;
    let code = |node: NodeId| doc.attribute(node, attr::CODE).unwrap_or_default().to_string();
    let mut entries = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for network in doc.descendants_named(inventory, element::NETWORK) {
        let net = code(network);
        entries.push(entry(0, format!("Network: {net}"), None));

        for station in doc.descendants_named(network, element::STATION) {
            let sta = code(station);
            let occurrence = bump(&mut seen, format!("{net}.{sta}"));
            entries.push(entry(
                1,
                format!("Station: {sta}"),
                Some(Address::Station {
                    network: net.clone(),
                    station: sta.clone(),
                    occurrence,
                }),
            ));

            for location in doc.descendants_named(station, element::SENSOR_LOCATION) {
                let loc = code(location);
                entries.push(entry(2, format!("Location: {loc}"), None));

                for stream in doc.children_named(location, element::STREAM) {
                    let cha = code(stream);
                    let occurrence = bump(&mut seen, format!("{net}.{sta}.{loc}.{cha}"));
                    entries.push(entry(
                        3,
                        format!("Stream: {cha}"),
                        Some(Address::Stream {
                            network: net.clone(),
                            station: sta.clone(),
                            location: loc.clone(),
                            channel: cha,
                            occurrence,
                        }),
                    ));
                }
            }
        }
    }

    let equipment: [(&str, &str, &str, fn(String) -> Address); 2] = [
        ("Sensors", "Sensor", element::SENSOR, Address::Sensor),
        ("Dataloggers", "Datalogger", element::DATALOGGER, Address::Datalogger),
    ];
    for (heading, label, name, address) in equipment {
        let nodes: Vec<NodeId> = doc.descendants_named(inventory, name).collect();
        if nodes.is_empty() {
            continue;
        }
        entries.push(entry(0, heading.to_string(), None));
        for node in nodes {
            entries.push(entry(
                1,
                format!("{label}: {}", doc.attribute(node, attr::NAME).unwrap_or_default()),
                doc.attribute(node, attr::PUBLIC_ID)
                    .map(|id| address(id.to_string())),
            ));
        }
    }

    Ok(entries)
}
