//! Workbook-level parts: sheet discovery, relationships, defined names,
//! table parts and content types

use std::collections::HashMap;

use log::warn;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use stencil_sheets_core::{CellRange, Insertions};

use crate::error::{XlsxError, XlsxResult};
use crate::package::Package;
use crate::xml::{self, Element};

/// Main workbook part
pub const WORKBOOK_PATH: &str = "xl/workbook.xml";
/// Relationships of the workbook part
pub const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";
/// Shared-string part
pub const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
/// Content types part
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

const SHARED_STRINGS_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
const SHARED_STRINGS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

/// A worksheet of the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// Sheet name as shown on the tab
    pub name: String,
    /// Part path inside the package
    pub path: String,
}

/// A package relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// `Id` attribute
    pub id: String,
    /// `Type` attribute
    pub rel_type: String,
    /// `Target` attribute, as written
    pub target: String,
}

impl Relationship {
    /// Whether the relationship type ends with `/{kind}`
    pub fn is(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit('/')
            .next()
            .is_some_and(|last| last == kind)
    }
}

/// Find every worksheet, in workbook order.
///
/// Sheets come from `xl/workbook.xml` and its relationships. A package
/// without a workbook part falls back to the files under `xl/worksheets/`.
pub fn sheet_entries(package: &Package) -> XlsxResult<Vec<SheetEntry>> {
    if !package.contains(WORKBOOK_PATH) {
        warn!("package has no {WORKBOOK_PATH}; using xl/worksheets/*.xml");
        return Ok(package
            .list_entries("xl/worksheets/*.xml")
            .into_iter()
            .map(|path| SheetEntry {
                name: file_stem(&path).to_string(),
                path,
            })
            .collect());
    }

    let sheets = read_workbook_sheets(&package.read_text(WORKBOOK_PATH)?)?;
    let rels = if package.contains(WORKBOOK_RELS_PATH) {
        read_relationships(&package.read_text(WORKBOOK_RELS_PATH)?)?
    } else {
        Vec::new()
    };

    let targets: HashMap<&str, &Relationship> = rels
        .iter()
        .filter(|rel| rel.is("worksheet"))
        .map(|rel| (rel.id.as_str(), rel))
        .collect();

    let mut entries = Vec::new();
    for (name, r_id) in sheets {
        match targets.get(r_id.as_str()) {
            Some(rel) => entries.push(SheetEntry {
                name,
                path: resolve_target("xl", &rel.target),
            }),
            // Chart sheets and dialog sheets have no cells to fill
            None => warn!("sheet {name:?} is not a worksheet part; skipped"),
        }
    }

    Ok(entries)
}

/// Read `(name, r:id)` for each `<sheet>` in workbook.xml
fn read_workbook_sheets(text: &str) -> XlsxResult<Vec<(String, String)>> {
    let mut xml_reader = Reader::from_str(text);
    xml_reader.trim_text(true);

    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut r_id = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => {
                            name = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                        b"r:id" => {
                            r_id = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                        _ => {}
                    }
                }

                if let (Some(name), Some(r_id)) = (name, r_id) {
                    sheets.push((name, r_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    Ok(sheets)
}

/// Read every `<Relationship>` of a `.rels` part
pub fn read_relationships(text: &str) -> XlsxResult<Vec<Relationship>> {
    let mut xml_reader = Reader::from_str(text);
    xml_reader.trim_text(true);

    let mut rels = Vec::new();

    loop {
        match xml_reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;

                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().ok().map(|s| s.to_string());
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Target" => target = value,
                        b"Type" => rel_type = value,
                        _ => {}
                    }
                }

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    Ok(rels)
}

/// Resolve a relationship target against the folder of its source part
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for piece in target.split('/') {
        match piece {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// `.rels` part describing the relationships of `part`
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn file_stem(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file)
}

/// Shift references to `sheet` inside every defined name of workbook.xml.
/// Returns the rewritten part, or `None` when nothing changed.
pub fn shift_defined_names(
    workbook_xml: &str,
    sheet: &str,
    insertions: &Insertions,
) -> XlsxResult<Option<String>> {
    let mut document = xml::parse(workbook_xml)?;
    let Some(defined_names) = document.root.child_mut("definedNames") else {
        return Ok(None);
    };

    let mut changed = false;
    for name in defined_names.elements_mut() {
        let formula = name.text();
        let shifted = insertions.shift_sheet_refs(&formula, sheet);
        if shifted != formula {
            name.set_text(shifted);
            changed = true;
        }
    }

    Ok(changed.then(|| document.to_xml()))
}

/// Shift the table parts attached to the worksheet at `sheet_path`.
///
/// Tables keep their column count: a table cannot gain columns without new
/// `tableColumn` definitions, so only its rows and position move.
pub fn shift_tables(
    package: &mut Package,
    sheet_path: &str,
    insertions: &Insertions,
) -> XlsxResult<()> {
    let rels_part = rels_path(sheet_path);
    if !package.contains(&rels_part) {
        return Ok(());
    }

    let rels = read_relationships(&package.read_text(&rels_part)?)?;
    for rel in rels.iter().filter(|rel| rel.is("table")) {
        let path = resolve_target(parent_dir(sheet_path), &rel.target);
        if !package.contains(&path) {
            warn!("table part {path} referenced by {sheet_path} is missing");
            continue;
        }

        let mut document = xml::parse(&package.read_text(&path)?)?;
        shift_table_ref(&mut document.root, insertions);
        if let Some(filter) = document.root.child_mut("autoFilter") {
            shift_table_ref(filter, insertions);
        }
        package.write_text(&path, &document.to_xml());
    }

    Ok(())
}

fn shift_table_ref(element: &mut Element, insertions: &Insertions) {
    let Some(reference) = element.attr("ref") else {
        return;
    };
    let Ok(range) = CellRange::parse(reference) else {
        warn!("unparsable table range {reference:?} left unchanged");
        return;
    };

    let shifted = insertions.shift_range(&range);
    let width = range.end.col - range.start.col;
    let kept = shifted.moved_to(
        (shifted.start.row, shifted.start.col),
        (shifted.end.row, shifted.start.col + width),
    );
    element.set_attr("ref", kept.to_string());
}

/// Make sure the package declares a shared-string part: a content-type
/// override and a workbook relationship
pub fn register_shared_strings(package: &mut Package) -> XlsxResult<()> {
    if package.contains(CONTENT_TYPES_PATH) {
        let mut types = xml::parse(&package.read_text(CONTENT_TYPES_PATH)?)?;
        let part_name = format!("/{SHARED_STRINGS_PATH}");
        let declared = types
            .root
            .elements()
            .any(|e| e.name == "Override" && e.attr("PartName") == Some(part_name.as_str()));
        if !declared {
            types.root = types.root.with_child(
                Element::new("Override")
                    .with_attr("PartName", part_name)
                    .with_attr("ContentType", SHARED_STRINGS_CONTENT_TYPE),
            );
            package.write_text(CONTENT_TYPES_PATH, &types.to_xml());
        }
    }

    if package.contains(WORKBOOK_RELS_PATH) {
        let text = package.read_text(WORKBOOK_RELS_PATH)?;
        let rels = read_relationships(&text)?;
        if !rels.iter().any(|rel| rel.is("sharedStrings")) {
            let next_id = rels
                .iter()
                .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
                .max()
                .unwrap_or(0)
                + 1;

            let mut document = xml::parse(&text)?;
            document.root = document.root.with_child(
                Element::new("Relationship")
                    .with_attr("Id", format!("rId{next_id}"))
                    .with_attr("Type", SHARED_STRINGS_TYPE)
                    .with_attr("Target", "sharedStrings.xml"),
            );
            package.write_text(WORKBOOK_RELS_PATH, &document.to_xml());
        }
    }

    Ok(())
}
