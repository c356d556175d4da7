//! quick-xml writer for the document arena

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Content, Document, NodeId};
use crate::{Error, Result};

pub(super) fn write(doc: &Document) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    for comment in &doc.prolog {
        emit(&mut writer, Event::Comment(BytesText::from_escaped(comment.as_str())))?;
    }
    write_element(&mut writer, doc, doc.root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, doc: &Document, id: NodeId) -> Result<()> {
    let node = doc.node(id);
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.content.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for content in &node.content {
        match content {
            Content::Element(child) => write_element(writer, doc, *child)?,
            Content::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
            Content::CData(text) => emit(writer, Event::CData(BytesCData::new(text.as_str())))?,
            Content::Comment(text) => {
                emit(writer, Event::Comment(BytesText::from_escaped(text.as_str())))?
            }
        }
    }
    emit(writer, Event::End(BytesEnd::new(node.name.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(format!("write failed: {e}")))
}
