//! Shared-string table rebuilding
//!
//! Every original `<si>` entry keeps its index. Entries whose whole text is
//! one placeholder are *superseded*: cells pointing at them are rewritten by
//! the worksheet engine, which appends whatever new strings it needs after
//! the original entries.

use std::collections::HashMap;

use log::warn;
use stencil_sheets_core::placeholder::{find_placeholders, sole_placeholder};
use stencil_sheets_core::{to_text, Accessor, Value};

use crate::xml::{escape_text, Document, Element, Node};

/// Namespace of the SpreadsheetML main part
pub const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// What happens to an original shared-string entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPlan {
    /// No placeholder; copied verbatim
    Carried,
    /// Placeholders mixed with other text; substituted in place
    Replaced,
    /// Exactly one placeholder; cells referencing it are rewritten
    Superseded(Accessor),
}

/// The shared-string table of one rendering run
#[derive(Debug, Clone)]
pub struct SharedStringTable {
    document: Option<Document>,
    entries: Vec<Element>,
    plans: Vec<EntryPlan>,
    added: Vec<String>,
    added_index: HashMap<String, usize>,
    references: usize,
}

impl SharedStringTable {
    /// Plan every entry of `document` (the parsed `sharedStrings.xml`, if
    /// the package has one) against `data`
    pub fn build(document: Option<Document>, data: &Value) -> Self {
        let mut entries = Vec::new();
        let mut plans = Vec::new();

        if let Some(doc) = &document {
            for si in doc.root.elements().filter(|e| e.name == "si") {
                let mut si = si.clone();
                let text = item_text(&si);

                let plan = if let Some(body) = sole_placeholder(&text) {
                    EntryPlan::Superseded(Accessor::parse(body))
                } else if find_placeholders(&text).is_empty() {
                    EntryPlan::Carried
                } else {
                    substitute_item(&mut si, data);
                    EntryPlan::Replaced
                };

                entries.push(si);
                plans.push(plan);
            }
        }

        Self {
            document,
            entries,
            plans,
            added: Vec::new(),
            added_index: HashMap::new(),
            references: 0,
        }
    }

    /// Number of original entries
    pub fn original_len(&self) -> usize {
        self.entries.len()
    }

    /// Number of strings appended during the run
    pub fn added_len(&self) -> usize {
        self.added.len()
    }

    /// Plan for original entry `index`
    pub fn plan(&self, index: usize) -> Option<&EntryPlan> {
        self.plans.get(index)
    }

    /// Text of original entry `index` after substitution
    pub fn text(&self, index: usize) -> Option<String> {
        self.entries.get(index).map(item_text)
    }

    /// Index for `text` as a new string, appending it unless an identical
    /// new string already exists
    pub fn add_string(&mut self, text: &str) -> usize {
        if let Some(&index) = self.added_index.get(text) {
            return index;
        }
        let index = self.entries.len() + self.added.len();
        self.added.push(text.to_string());
        self.added_index.insert(text.to_string(), index);
        index
    }

    /// Count one cell referencing the table
    pub fn reference(&mut self) {
        self.references += 1;
    }

    /// Whether the package needs a `sharedStrings.xml` part
    pub fn is_needed(&self) -> bool {
        self.document.is_some() || !self.added.is_empty()
    }

    /// Rebuild the part
    pub fn to_document(&self) -> Document {
        let mut document = self.document.clone().unwrap_or_else(|| Document {
            declaration: Some(r#"xml version="1.0" encoding="UTF-8" standalone="yes""#.into()),
            root: Element::new("sst").with_attr("xmlns", MAIN_NS),
        });

        let trailing: Vec<Node> = document
            .root
            .children
            .drain(..)
            .filter(|node| !matches!(node, Node::Element(e) if e.name == "si"))
            .filter(|node| matches!(node, Node::Element(_)))
            .collect();

        let root = &mut document.root;
        root.children
            .extend(self.entries.iter().cloned().map(Node::Element));
        root.children
            .extend(self.added.iter().map(|text| Node::Element(new_item(text))));
        root.children.extend(trailing);

        root.set_attr("count", self.references.to_string());
        root.set_attr("uniqueCount", (self.entries.len() + self.added.len()).to_string());

        document
    }
}

/// Visible text of an `<si>` entry: its `<t>` and run `<t>` nodes, without
/// phonetic (`rPh`) runs
pub fn item_text(si: &Element) -> String {
    let mut text = String::new();
    for child in si.elements() {
        match child.name.as_str() {
            "t" => text.push_str(&child.text()),
            "r" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            _ => {}
        }
    }
    text
}

/// Replace each placeholder in `text` with the text of its resolved value.
/// Undefined values become empty text.
pub fn substitute_text(text: &str, data: &Value) -> String {
    stencil_sheets_core::placeholder::substitute(text, |body| stringify(body, data))
}

fn stringify(body: &str, data: &Value) -> String {
    data.resolve(&Accessor::parse(body))
        .map(|value| to_text(&value))
        .unwrap_or_default()
}

/// Build a plain `<si><t>..</t></si>` entry
pub fn new_item(text: &str) -> Element {
    Element::new("si").with_child(text_element(text))
}

/// A `<t>` element, marked `xml:space="preserve"` when whitespace would
/// otherwise be lost
pub fn text_element(text: &str) -> Element {
    let mut t = Element::new("t");
    if needs_preserve(text) {
        t.set_attr("xml:space", "preserve");
    }
    if !text.is_empty() {
        t = t.with_text(text);
    }
    t
}

fn needs_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text.contains('\n')
}

fn substitute_item(si: &mut Element, data: &Value) {
    let rich = si.has_child("r");
    if !rich {
        if let Some(t) = si.child_mut("t") {
            let text = substitute_text(&t.text(), data);
            *t = text_element(&text);
        }
        return;
    }

    // Runs: substitute inside the serialized markup so formatting survives
    let inner = si.inner_xml();
    let mut out = String::with_capacity(inner.len());
    let mut last = 0;
    for placeholder in find_placeholders(&inner) {
        // A placeholder split across runs is left alone
        if placeholder.body.contains('<') {
            continue;
        }
        let body = unescape_text(placeholder.body);
        out.push_str(&inner[last..placeholder.start]);
        out.push_str(&escape_text(&stringify(&body, data)));
        last = placeholder.end;
    }
    out.push_str(&inner[last..]);

    if let Err(err) = si.set_inner_xml(&out) {
        warn!("could not substitute rich text entry: {err}");
    }
}

fn unescape_text(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
