//! quick-xml event reader into the document arena

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Content, Document, Node, NodeId};
use crate::{Error, Result};

pub(super) fn parse(xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);

    let mut nodes: Vec<Node> = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;
    let mut prolog = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::Xml(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Start(e) => {
                let id = open_element(&mut nodes, &stack, &mut root, &e)?;
                stack.push(id);
            }
            Event::Empty(e) => {
                open_element(&mut nodes, &stack, &mut root, &e)?;
            }
            Event::End(_) => {
                if let Some(closed) = stack.pop() {
                    drop_indentation(&mut nodes[closed.0]);
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                if stack.is_empty() && text.trim().is_empty() {
                    continue;
                }
                push_content(&mut nodes, &stack, Content::Text(text))?;
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                push_content(&mut nodes, &stack, Content::CData(text))?;
            }
            Event::Comment(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                match stack.last() {
                    Some(_) => push_content(&mut nodes, &stack, Content::Comment(text))?,
                    None if root.is_none() => prolog.push(text),
                    None => {}
                }
            }
            Event::Eof => break,
            // Declaration, processing instructions and doctype are regenerated on write
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!(
            "unexpected end of document inside <{}>",
            nodes[open.0].name
        )));
    }
    let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;

    Ok(Document {
        nodes,
        root,
        prolog,
    })
}

fn open_element(
    nodes: &mut Vec<Node>,
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    start: &BytesStart<'_>,
) -> Result<NodeId> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let parent = stack.last().copied();
    if parent.is_none() && root.is_some() {
        return Err(Error::Xml(format!("second root element <{name}>")));
    }

    let mut node = Node::new(name, parent);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attributes.push((key, value));
    }

    let id = NodeId(nodes.len());
    nodes.push(node);
    match parent {
        Some(parent) => nodes[parent.0].content.push(Content::Element(id)),
        None => *root = Some(id),
    }
    Ok(id)
}

/// Whitespace-only text beside child elements is indentation, regenerated on
/// write. Text of leaf elements is kept as written, blank or not.
fn drop_indentation(node: &mut Node) {
    if node.content.iter().any(|c| matches!(c, Content::Element(_))) {
        node.content
            .retain(|c| !matches!(c, Content::Text(t) if t.trim().is_empty()));
    }
}

fn push_content(nodes: &mut [Node], stack: &[NodeId], content: Content) -> Result<()> {
    match stack.last() {
        Some(top) => {
            nodes[top.0].content.push(content);
            Ok(())
        }
        None => Err(Error::Xml("content outside the root element".to_string())),
    }
}
