//! Generic XML sections.
//!
//! LUT data, grabber settings, custom data and app info are stored as XML
//! documents. They are decoded into a plain element tree and handed out
//! as-is; nothing downstream normalizes them further.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::DecodeError;

/// One XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated text and CDATA content directly inside this element
    pub text: Option<String>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode an XML section into its root element.
///
/// UTF-16LE documents (with a byte-order mark) are transcoded first, and
/// trailing NUL padding is ignored.
pub fn decode_xml(data: &[u8]) -> Result<XmlNode, DecodeError> {
    let text = section_text(data)?;
    let mut reader = Reader::from_str(&text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DecodeError::Xml(e.to_string()))?;

        match event {
            Event::Start(e) => stack.push(element(&e)?),
            Event::Empty(e) => {
                let node = element(&e)?;
                attach(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| DecodeError::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, node);
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| DecodeError::Xml(e.to_string()))?;
                append_text(&mut stack, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_text(&mut stack, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DecodeError::Xml("unclosed element".to_string()));
    }
    root.ok_or(DecodeError::EmptyXml)
}

fn section_text(data: &[u8]) -> Result<String, DecodeError> {
    if let Some(body) = data.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let text = String::from_utf16(&units).map_err(|e| DecodeError::Xml(e.to_string()))?;
        return Ok(text.trim_end_matches('\0').to_string());
    }

    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let text = std::str::from_utf8(data).map_err(|e| DecodeError::Xml(e.to_string()))?;
    Ok(text.trim_end_matches('\0').to_string())
}

fn element(start: &BytesStart<'_>) -> Result<XmlNode, DecodeError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DecodeError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| DecodeError::Xml(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlNode {
        name,
        attributes,
        ..Default::default()
    })
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn append_text(stack: &mut [XmlNode], text: &str) {
    if let Some(node) = stack.last_mut() {
        node.text.get_or_insert_with(String::new).push_str(text);
    }
}
