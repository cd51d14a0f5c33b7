//! ZAPI Element Tree
//!
//! A ZAPI request or response is a plain XML tree. [`ZapiElement`] is used
//! both to build outgoing calls (`add_new_child`) and to walk replies
//! (`child_by_name`, `children`).

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

// =============================================================================
// Element
// =============================================================================

/// One node of a ZAPI document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZapiElement {
    name: String,
    content: String,
    attributes: Vec<(String, String)>,
    children: Vec<ZapiElement>,
}

impl ZapiElement {
    /// Create an empty element, typically the API call to invoke
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a leaf element holding text content
    pub fn with_content(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content, all character data of the element joined and trimmed
    /// once (empty when there is none)
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct children in document order
    pub fn children(&self) -> &[ZapiElement] {
        &self.children
    }

    /// First direct child with the given tag name
    pub fn child_by_name(&self, name: &str) -> Option<&ZapiElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Consume the element, returning the first direct child with the given tag name
    pub fn into_child_by_name(self, name: &str) -> Option<ZapiElement> {
        self.children.into_iter().find(|child| child.name == name)
    }

    /// Text content of the first direct child with the given tag name
    pub fn child_content(&self, name: &str) -> Option<&str> {
        self.child_by_name(name).map(|child| child.content())
    }

    /// Append a leaf child (`<name>content</name>`)
    pub fn add_new_child(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.children.push(ZapiElement::with_content(name, content));
    }

    /// Append an already built child element
    pub fn add_child_elem(&mut self, child: ZapiElement) {
        self.children.push(child);
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Builder form of [`add_new_child`](Self::add_new_child)
    pub fn child(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.add_new_child(name, content);
        self
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Parse a document and return its root element
    ///
    /// Text and CDATA chunks of an element are concatenated and trimmed
    /// when the element closes, so whitespace between two chunks survives.
    /// Comments, processing instructions and the doctype are ignored.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let mut stack: Vec<ZapiElement> = Vec::new();
        let mut root: Option<ZapiElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.content.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .content
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::End(_) => {
                    let mut element = stack.pop().ok_or_else(|| {
                        Error::MalformedResponse("unbalanced closing tag".into())
                    })?;
                    trim_content(&mut element.content);
                    attach(&mut stack, &mut root, element);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::MalformedResponse(format!(
                "document ended inside <{}>",
                stack[stack.len() - 1].name
            )));
        }

        root.ok_or_else(|| Error::MalformedResponse("document has no root element".into()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = ZapiElement::new(String::from_utf8_lossy(start.local_name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize this element (without XML declaration)
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_into(&mut writer)?;
        into_string(writer.into_inner())
    }

    /// Serialize this element as a standalone document with XML declaration
    pub fn to_document(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.write_into(&mut writer)?;
        into_string(writer.into_inner())
    }

    fn write_into<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.content.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if !self.content.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&self.content)))?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;

        Ok(())
    }
}

fn attach(stack: &mut [ZapiElement], root: &mut Option<ZapiElement>, element: ZapiElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn trim_content(content: &mut String) {
    let trimmed = content.trim();
    if trimmed.len() != content.len() {
        *content = trimmed.to_string();
    }
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| Error::MalformedResponse(format!("non UTF-8 output: {}", e)))
}
