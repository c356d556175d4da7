//! Owned inventory document tree
//!
//! The document is an arena of element nodes addressed by [`NodeId`]. Handles
//! are plain indices: they stay valid across every mutation and across a save,
//! because removed subtrees are only marked detached and their slots are never
//! reused. A reload produces a fresh `Document`, so handles from a previous
//! load must not be carried over.
//!
//! Element and attribute lookups match on the local name, ignoring any
//! namespace prefix. Qualified names are kept verbatim for writing.

mod parse;
mod write;

use std::path::Path;

use tracing::{info, warn};

use crate::schema::{element, NAMESPACE_PREFIX};
use crate::{Error, Result};

/// Stable handle to an element of a loaded [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of this node
    pub fn index(self) -> usize {
        self.0
    }
}

/// One item of an element's ordered content
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Content {
    Element(NodeId),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) content: Vec<Content>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) detached: bool,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            content: Vec::new(),
            parent,
            detached: false,
        }
    }
}

/// Parsed inventory document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    /// Comments appearing before the root element
    prolog: Vec<String>,
}

fn local(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, l)| l)
}

impl Document {
    /// Parse an inventory document and check its structural presence rules
    ///
    /// The root element must be `seiscomp` and must hold an `Inventory`
    /// child; anything else is [`Error::Structural`].
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = parse::parse(xml)?;
        doc.inventory()?;
        Ok(doc)
    }

    /// Read and parse an inventory document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        let doc = Self::parse(&xml)?;
        match doc.attribute(doc.root, "xmlns") {
            Some(ns) if !ns.starts_with(NAMESPACE_PREFIX) => {
                warn!("{} uses unexpected namespace {}", path.display(), ns)
            }
            _ => {}
        }
        info!(
            "Loaded inventory document {} ({} elements)",
            path.display(),
            doc.nodes.len()
        );
        Ok(doc)
    }

    /// Root element handle
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `Inventory` container below the root
    pub fn inventory(&self) -> Result<NodeId> {
        if self.local_name(self.root) != element::ROOT {
            return Err(Error::Structural(format!(
                "root element is <{}>, expected <{}>",
                self.name(self.root),
                element::ROOT
            )));
        }
        self.child(self.root, element::INVENTORY).ok_or_else(|| {
            Error::Structural(format!(
                "no <{}> element below <{}>",
                element::INVENTORY,
                element::ROOT
            ))
        })
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Qualified element name as written in the document
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// Element name without namespace prefix
    pub fn local_name(&self, id: NodeId) -> &str {
        local(&self.node(id).name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// False once the node (or one of its ancestors) has been removed
    pub fn is_attached(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len() && !self.node(id).detached
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Assign an attribute, keeping its position when it already exists
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let attributes = &mut self.node_mut(id).attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attributes = &mut self.node_mut(id).attributes;
        let pos = attributes.iter().position(|(k, _)| k == name)?;
        Some(attributes.remove(pos).1)
    }

    /// Direct child elements in document order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).content.iter().filter_map(|c| match c {
            Content::Element(child) => Some(*child),
            _ => None,
        })
    }

    /// Direct child elements with the given local name
    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        local_name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .filter(move |child| self.local_name(*child) == local_name)
    }

    /// First direct child element with the given local name
    pub fn child(&self, id: NodeId, local_name: &str) -> Option<NodeId> {
        self.children_named(id, local_name).next()
    }

    /// All descendant elements with the given local name, pre-order
    pub fn descendants_named<'a>(&'a self, id: NodeId, local_name: &'a str) -> Descendants<'a> {
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        Descendants {
            doc: self,
            stack,
            local_name,
        }
    }

    /// Concatenated text and CDATA content of an element
    pub fn text(&self, id: NodeId) -> String {
        self.node(id)
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) | Content::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text of the first child with the given local name
    ///
    /// `None` when the child is absent; `Some("")` when it is present but
    /// blank.
    pub fn child_text(&self, id: NodeId, local_name: &str) -> Option<String> {
        self.child(id, local_name).map(|child| self.text(child))
    }

    /// Replace all text content of an element
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        let content = &mut self.node_mut(id).content;
        let first_text = content
            .iter()
            .position(|c| matches!(c, Content::Text(_) | Content::CData(_)));
        content.retain(|c| !matches!(c, Content::Text(_) | Content::CData(_)));
        if !value.is_empty() {
            let at = first_text.unwrap_or(0).min(content.len());
            content.insert(at, Content::Text(value.to_string()));
        }
    }

    /// Set the text of a child element, creating the child when absent
    pub fn set_child_text(&mut self, id: NodeId, local_name: &str, value: &str) -> NodeId {
        let child = match self.child(id, local_name) {
            Some(child) => child,
            None => self.append_child(id, local_name),
        };
        self.set_text(child, value);
        child
    }

    /// Append a new empty child element
    ///
    /// The child inherits the parent's namespace prefix.
    pub fn append_child(&mut self, parent: NodeId, local_name: &str) -> NodeId {
        let name = match self.name(parent).rsplit_once(':') {
            Some((prefix, _)) => format!("{prefix}:{local_name}"),
            None => local_name.to_string(),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, Some(parent)));
        self.node_mut(parent).content.push(Content::Element(id));
        id
    }

    /// Remove every child with the given local name
    ///
    /// Returns false when no such child exists.
    pub fn remove_child(&mut self, parent: NodeId, local_name: &str) -> bool {
        let doomed: Vec<NodeId> = self.children_named(parent, local_name).collect();
        if doomed.is_empty() {
            return false;
        }
        self.node_mut(parent).content.retain(|c| match c {
            Content::Element(child) => !doomed.contains(child),
            _ => true,
        });
        for child in doomed {
            self.detach(child);
        }
        true
    }

    fn detach(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            pending.extend(self.children(next));
            self.node_mut(next).detached = true;
        }
    }

    /// Serialise to UTF-8 XML with declaration and two-space indentation
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>> {
        write::write(self)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let bytes = self.to_xml_bytes()?;
        String::from_utf8(bytes).map_err(|e| Error::Xml(e.to_string()))
    }
}

/// Lazy pre-order iterator over descendants with a given local name
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
    local_name: &'a str,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let first_child = self.stack.len();
            self.stack.extend(self.doc.children(id));
            self.stack[first_child..].reverse();
            if self.doc.local_name(id) == self.local_name {
                return Some(id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<seiscomp xmlns="http://geofon.gfz-potsdam.de/ns/seiscomp3-schema/0.12" version="0.12">
  <Inventory>
    <network code="GE">
      <station code="WLF" name="Walferdange">
        <description>Walferdange, Luxembourg</description>
        <sensorLocation code="">
          <stream code="BHZ"><depth>0</depth></stream>
          <stream code="BHN"/>
        </sensorLocation>
      </station>
    </network>
  </Inventory>
</seiscomp>"#;

    fn station(doc: &Document) -> NodeId {
        let inventory = doc.inventory().unwrap();
        doc.descendants_named(inventory, "station").next().unwrap()
    }

    #[test]
    fn test_parse_and_navigate() {
        let doc = Document::parse(DOC).unwrap();
        let sta = station(&doc);
        assert_eq!(doc.attribute(sta, "code"), Some("WLF"));
        assert_eq!(
            doc.child_text(sta, "description").as_deref(),
            Some("Walferdange, Luxembourg")
        );
        assert_eq!(doc.child_text(sta, "latitude"), None);

        let streams: Vec<_> = doc
            .descendants_named(doc.root(), "stream")
            .map(|s| doc.attribute(s, "code").unwrap().to_string())
            .collect();
        assert_eq!(streams, vec!["BHZ", "BHN"]);
    }

    #[test]
    fn test_blank_child_is_present_but_empty() {
        let doc = Document::parse(DOC).unwrap();
        let inventory = doc.inventory().unwrap();
        let bhn = doc.descendants_named(inventory, "stream").nth(1).unwrap();
        assert_eq!(doc.child_text(bhn, "depth"), None);

        let xml = DOC.replace("<stream code=\"BHN\"/>", "<stream code=\"BHN\"><depth></depth></stream>");
        let doc = Document::parse(&xml).unwrap();
        let bhn = doc.descendants_named(doc.root(), "stream").nth(1).unwrap();
        assert_eq!(doc.child_text(bhn, "depth").as_deref(), Some(""));
    }

    #[test]
    fn test_structural_errors() {
        let err = Document::parse("<seiscomp><Other/></seiscomp>").unwrap_err();
        assert!(matches!(err, Error::Structural(_)));

        let err = Document::parse("<quakeml><Inventory/></quakeml>").unwrap_err();
        assert!(matches!(err, Error::Structural(_)));

        let err = Document::parse("<seiscomp><Inventory></seiscomp>").unwrap_err();
        assert!(matches!(err, Error::Xml(_)));
    }

    #[test]
    fn test_set_and_remove_child_text() {
        let mut doc = Document::parse(DOC).unwrap();
        let sta = station(&doc);

        let lat = doc.set_child_text(sta, "latitude", "49.66");
        assert_eq!(doc.child_text(sta, "latitude").as_deref(), Some("49.66"));
        assert!(doc.is_attached(lat));

        doc.set_child_text(sta, "latitude", "49.7");
        assert_eq!(doc.children_named(sta, "latitude").count(), 1);

        assert!(doc.remove_child(sta, "latitude"));
        assert!(!doc.is_attached(lat));
        assert!(!doc.remove_child(sta, "latitude"));
        assert_eq!(doc.child_text(sta, "latitude"), None);
    }

    #[test]
    fn test_remove_child_takes_every_duplicate() {
        let xml = DOC.replace(
            "<description>Walferdange, Luxembourg</description>",
            "<description>one</description><description>two</description>",
        );
        let mut doc = Document::parse(&xml).unwrap();
        let sta = station(&doc);
        let duplicates: Vec<NodeId> = doc.children_named(sta, "description").collect();
        assert_eq!(duplicates.len(), 2);

        assert!(doc.remove_child(sta, "description"));
        assert_eq!(doc.child(sta, "description"), None);
        assert!(duplicates.iter().all(|d| !doc.is_attached(*d)));
        assert!(!doc.remove_child(sta, "description"));
    }

    #[test]
    fn test_text_kept_verbatim_through_save() {
        let xml = DOC.replace(
            "<description>Walferdange, Luxembourg</description>",
            "<description>  Cave  </description>",
        );
        let doc = Document::parse(&xml).unwrap();
        let sta = station(&doc);
        assert_eq!(doc.child_text(sta, "description").as_deref(), Some("  Cave  "));

        let written = doc.to_xml_string().unwrap();
        assert!(written.contains("<description>  Cave  </description>"));
        assert_eq!(Document::parse(&written).unwrap().to_xml_string().unwrap(), written);

        let blank = DOC.replace("<depth>0</depth>", "<depth> </depth>");
        let written = Document::parse(&blank).unwrap().to_xml_string().unwrap();
        assert!(written.contains("<depth> </depth>"));
        // Indentation between elements does not become content
        assert_eq!(doc.children(doc.root()).count(), 1);
        assert_eq!(doc.text(doc.root()), "");
    }

    #[test]
    fn test_attribute_set_and_remove() {
        let mut doc = Document::parse(DOC).unwrap();
        let sta = station(&doc);

        doc.set_attribute(sta, "code", "WLF2");
        assert_eq!(doc.attribute(sta, "code"), Some("WLF2"));
        assert_eq!(doc.remove_attribute(sta, "name").as_deref(), Some("Walferdange"));
        assert_eq!(doc.attribute(sta, "name"), None);
        assert_eq!(doc.remove_attribute(sta, "name"), None);
    }

    #[test]
    fn test_prefixed_children_inherit_prefix() {
        let xml = r#"<sc3:seiscomp xmlns:sc3="urn:x"><sc3:Inventory><sc3:station code="A"/></sc3:Inventory></sc3:seiscomp>"#;
        let mut doc = Document::parse(xml).unwrap();
        let sta = doc.descendants_named(doc.root(), "station").next().unwrap();
        let child = doc.set_child_text(sta, "elevation", "12");
        assert_eq!(doc.name(child), "sc3:elevation");
        assert_eq!(doc.local_name(child), "elevation");
    }

    #[test]
    fn test_write_round_trip_preserves_content() {
        let mut doc = Document::parse(DOC).unwrap();
        let sta = station(&doc);
        doc.set_child_text(sta, "description", "Caves & mine <WLF>");

        let xml = doc.to_xml_string().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xmlns=\"http://geofon.gfz-potsdam.de/ns/seiscomp3-schema/0.12\""));
        assert!(xml.contains("Caves &amp; mine &lt;WLF&gt;"));

        let reparsed = Document::parse(&xml).unwrap();
        let sta = station(&reparsed);
        assert_eq!(
            reparsed.child_text(sta, "description").as_deref(),
            Some("Caves & mine <WLF>")
        );
        assert_eq!(reparsed.to_xml_string().unwrap(), xml);
    }
}
