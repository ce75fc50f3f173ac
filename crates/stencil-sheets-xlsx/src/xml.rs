//! A small owned XML tree
//!
//! Worksheets and the shared-string table are parsed into [`Element`] trees,
//! rebuilt, and written back. Attribute order, namespace prefixes, comments
//! and whitespace text are kept as read; nothing is added to the root.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

/// A child of an element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data, unescaped
    Text(String),
    /// `<![CDATA[...]]>` content
    CData(String),
    /// `<!--...-->` content
    Comment(String),
    /// `<?...?>` content
    Instruction(String),
}

/// An element with its attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as written (`c`, `x14:id`)
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes
    pub children: Vec<Node>,
}

/// A parsed XML part
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Raw content of the `<?xml ...?>` declaration, if present
    pub declaration: Option<String>,
    /// Root element
    pub root: Element,
}

impl Element {
    /// Create an element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder: add a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Builder: add a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    fn from_start(e: &BytesStart<'_>) -> XlsxResult<Self> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Get an attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    /// Child elements
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Mutable child elements
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element named `name`
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// First mutable child element named `name`
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Whether a child element named `name` exists
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Remove every child element named `name`
    pub fn remove_children(&mut self, name: &str) {
        self.children
            .retain(|node| !matches!(node, Node::Element(e) if e.name == name));
    }

    /// Concatenated text of direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Serialize this element and its subtree
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    /// Serialize only the children
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_to(&mut out);
        }
        out
    }

    /// Replace the children with the nodes parsed from `xml`
    pub fn set_inner_xml(&mut self, xml: &str) -> XlsxResult<()> {
        let wrapped = format!("<{0}>{1}</{0}>", self.name, xml);
        let parsed = parse(&wrapped)?;
        self.children = parsed.root.children;
        Ok(())
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl Node {
    fn write_to(&self, out: &mut String) {
        match self {
            Node::Element(e) => e.write_to(out),
            Node::Text(t) => out.push_str(&escape_text(t)),
            Node::CData(t) => {
                out.push_str("<![CDATA[");
                out.push_str(t);
                out.push_str("]]>");
            }
            Node::Comment(t) => {
                out.push_str("<!--");
                out.push_str(t);
                out.push_str("-->");
            }
            Node::Instruction(t) => {
                out.push_str("<?");
                out.push_str(t);
                out.push_str("?>");
            }
        }
    }
}

impl Document {
    /// Serialize, declaration first
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            out.push_str("<?");
            out.push_str(decl);
            out.push_str("?>\n");
        }
        self.root.write_to(&mut out);
        out
    }
}

/// Parse a complete XML document
pub fn parse(text: &str) -> XlsxResult<Document> {
    let mut reader = Reader::from_str(text);
    let mut declaration = None;
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Decl(d) => {
                declaration = Some(String::from_utf8_lossy(&d).into_owned());
            }
            Event::Start(e) => stack.push(Element::from_start(&e)?),
            Event::Empty(e) => {
                let element = Element::from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XlsxError::Parse("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(t.unescape()?.into_owned()));
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    parent.children.push(Node::CData(text));
                }
            }
            Event::Comment(c) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    parent.children.push(Node::Comment(text));
                }
            }
            Event::PI(p) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&p).into_owned();
                    parent.children.push(Node::Instruction(text));
                }
            }
            Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(XlsxError::Parse("unclosed element".into()));
    }

    let root = root.ok_or_else(|| XlsxError::Parse("document has no root element".into()))?;
    Ok(Document { declaration, root })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> XlsxResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(XlsxError::Parse("multiple root elements".into())),
    }
    Ok(())
}

/// Escape character data
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value
pub fn escape_attr(s: &str) -> String {
    escape_text(s)
        .replace('"', "&quot;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}
