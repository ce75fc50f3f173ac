//! Common utilities for the rendering tests.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use stencil_sheets_core::Value;
use stencil_sheets_xlsx::xml::{self, Document};
use stencil_sheets_xlsx::{Package, RenderOptions, Rendered, TemplateRenderer};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A worksheet of a [`TemplateBuilder`]
pub struct SheetDef {
    name: String,
    rows: String,
    tail: String,
    rels: Vec<(String, String, String)>,
}

/// Builds a minimal `.xlsx` template in memory.
///
/// Rows are given as `<row>` markup; shared strings are listed by text and
/// referenced from cells by index.
#[derive(Default)]
pub struct TemplateBuilder {
    sheets: Vec<SheetDef>,
    shared_strings: Option<Vec<String>>,
    defined_names: Vec<(String, String)>,
    parts: Vec<(String, String)>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the shared-string table
    pub fn strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = Some(strings.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Add a worksheet with `<sheetData>` rows and markup following it
    pub fn sheet(mut self, name: &str, rows: &str, tail: &str) -> Self {
        self.sheets.push(SheetDef {
            name: name.to_string(),
            rows: rows.to_string(),
            tail: tail.to_string(),
            rels: Vec::new(),
        });
        self
    }

    /// Attach a table part to the last added sheet
    pub fn table(mut self, path: &str, content: &str) -> Self {
        if let Some(sheet) = self.sheets.last_mut() {
            let id = format!("rId{}", sheet.rels.len() + 1);
            let target = format!("../{}", path.trim_start_matches("xl/"));
            sheet.rels.push((id, format!("{REL_NS}/table"), target));
        }
        self.parts.push((path.to_string(), content.to_string()));
        self
    }

    /// Add a defined name
    pub fn defined_name(mut self, name: &str, formula: &str) -> Self {
        self.defined_names.push((name.to_string(), formula.to_string()));
        self
    }

    /// Package everything into `.xlsx` bytes
    pub fn build(self) -> Vec<u8> {
        let mut files: Vec<(String, String)> = Vec::new();

        let mut types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        for i in 0..self.sheets.len() {
            types.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }
        if self.shared_strings.is_some() {
            types.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
        }
        types.push_str("</Types>");
        files.push(("[Content_Types].xml".into(), types));

        files.push((
            "_rels/.rels".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
            ),
        ));

        let mut workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>"#
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                xml::escape_attr(&sheet.name),
                i + 1,
                i + 1
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }
        workbook.push_str("</sheets>");
        if !self.defined_names.is_empty() {
            workbook.push_str("<definedNames>");
            for (name, formula) in &self.defined_names {
                workbook.push_str(&format!(
                    r#"<definedName name="{name}">{}</definedName>"#,
                    xml::escape_text(formula)
                ));
            }
            workbook.push_str("</definedNames>");
        }
        workbook.push_str("</workbook>");
        if self.shared_strings.is_some() {
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/>"#,
                self.sheets.len() + 1
            ));
        }
        rels.push_str("</Relationships>");
        files.push(("xl/workbook.xml".into(), workbook));
        files.push(("xl/_rels/workbook.xml.rels".into(), rels));

        for (i, sheet) in self.sheets.iter().enumerate() {
            files.push((
                format!("xl/worksheets/sheet{}.xml", i + 1),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheetData>{}</sheetData>{}</worksheet>"#,
                    sheet.rows, sheet.tail
                ),
            ));
            if !sheet.rels.is_empty() {
                let mut sheet_rels = String::from(
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                );
                for (id, rel_type, target) in &sheet.rels {
                    sheet_rels.push_str(&format!(
                        r#"<Relationship Id="{id}" Type="{rel_type}" Target="{target}"/>"#
                    ));
                }
                sheet_rels.push_str("</Relationships>");
                files.push((format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1), sheet_rels));
            }
        }

        if let Some(strings) = &self.shared_strings {
            let mut sst = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{MAIN_NS}" count="{0}" uniqueCount="{0}">"#,
                strings.len()
            );
            for s in strings {
                sst.push_str(&format!("<si><t>{}</t></si>", xml::escape_text(s)));
            }
            sst.push_str("</sst>");
            files.push(("xl/sharedStrings.xml".into(), sst));
        }

        files.extend(self.parts);
        zip_of(&files)
    }
}

/// Write `(name, content)` pairs into a ZIP archive
pub fn zip_of(files: &[(String, String)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        zip.start_file(name.as_str(), zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Render with default options
pub fn render(template: &[u8], data: &Value) -> Rendered {
    TemplateRenderer::render(template, data, &RenderOptions::default()).unwrap()
}

/// Parse one part of a rendered package
pub fn part(bytes: &[u8], path: &str) -> Document {
    let package = Package::from_bytes(bytes).unwrap();
    xml::parse(&package.read_text(path).unwrap()).unwrap()
}

/// A rendered cell, with shared strings looked up
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(String),
    Bool(String),
    Formula(String),
    Empty,
}

/// Every cell of a worksheet by reference
pub fn cells(bytes: &[u8], sheet_path: &str) -> BTreeMap<String, Cell> {
    let package = Package::from_bytes(bytes).unwrap();
    let strings: Vec<String> = if package.contains("xl/sharedStrings.xml") {
        let sst = xml::parse(&package.read_text("xl/sharedStrings.xml").unwrap()).unwrap();
        sst.root
            .elements()
            .filter(|e| e.name == "si")
            .map(stencil_sheets_xlsx::shared_strings::item_text)
            .collect()
    } else {
        Vec::new()
    };

    let sheet = xml::parse(&package.read_text(sheet_path).unwrap()).unwrap();
    let mut out = BTreeMap::new();
    for row in sheet.root.child("sheetData").unwrap().elements() {
        for c in row.elements() {
            let value = c.child("v").map(|v| v.text());
            let cell = if let Some(f) = c.child("f") {
                Cell::Formula(f.text())
            } else {
                match (c.attr("t"), value) {
                    (_, None) => Cell::Empty,
                    (Some("s"), Some(v)) => Cell::Text(strings[v.parse::<usize>().unwrap()].clone()),
                    (Some("b"), Some(v)) => Cell::Bool(v),
                    (_, Some(v)) => Cell::Number(v),
                }
            };
            out.insert(c.attr("r").unwrap().to_string(), cell);
        }
    }
    out
}

pub fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

pub fn number(s: &str) -> Cell {
    Cell::Number(s.to_string())
}

/// Shared-string cell referencing entry `index`
pub fn s(r: &str, index: usize) -> String {
    format!(r#"<c r="{r}" t="s"><v>{index}</v></c>"#)
}
