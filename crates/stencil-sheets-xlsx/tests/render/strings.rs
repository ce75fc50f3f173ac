//! Shared-string table rebuilding

use pretty_assertions::assert_eq;
use stencil_sheets_core::Value;
use stencil_sheets_xlsx::{Package, TemplateRenderer};

use crate::*;

const SHEET1: &str = "xl/worksheets/sheet1.xml";

fn v_of(sheet: &stencil_sheets_xlsx::xml::Document, r: &str) -> String {
    sheet
        .root
        .child("sheetData")
        .unwrap()
        .elements()
        .flat_map(|row| row.elements())
        .find(|c| c.attr("r") == Some(r))
        .and_then(|c| c.child("v"))
        .map(|v| v.text())
        .unwrap()
}

#[test]
fn test_identical_new_text_shares_one_entry() {
    let template = TemplateBuilder::new()
        .strings(&["${a}", "${b}", "same"])
        .sheet(
            "S",
            &format!(r#"<row r="1">{}{}{}</row>"#, s("A1", 0), s("B1", 1), s("C1", 2)),
            "",
        )
        .build();
    let data: Value = serde_json::json!({"a": "same", "b": "same"}).into();

    let out = render(&template, &data);
    let sheet = part(&out.bytes, SHEET1);

    // New strings are deduplicated among themselves only
    assert_eq!(v_of(&sheet, "A1"), "3");
    assert_eq!(v_of(&sheet, "B1"), "3");
    assert_eq!(v_of(&sheet, "C1"), "2");

    let sst = part(&out.bytes, "xl/sharedStrings.xml");
    assert_eq!(sst.root.attr("uniqueCount"), Some("4"));
    assert_eq!(sst.root.attr("count"), Some("3"));
    assert_eq!(out.report.strings_added, 1);
}

#[test]
fn test_superseded_entries_keep_their_index() {
    let template = TemplateBuilder::new()
        .strings(&["${name}", "Label"])
        .sheet(
            "S",
            &format!(r#"<row r="1">{}{}</row>"#, s("A1", 0), s("B1", 1)),
            "",
        )
        .build();
    let data: Value = serde_json::json!({"name": "Ada"}).into();

    let out = render(&template, &data);
    let sst = part(&out.bytes, "xl/sharedStrings.xml");
    let texts: Vec<String> = sst
        .root
        .elements()
        .map(stencil_sheets_xlsx::shared_strings::item_text)
        .collect();
    assert_eq!(texts, vec!["${name}", "Label", "Ada"]);
}

#[test]
fn test_inline_only_template_gains_shared_strings_part() {
    let template = TemplateBuilder::new()
        .sheet(
            "Inline",
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>${title}</t></is></c></row>"#,
            "",
        )
        .build();
    let data: Value = serde_json::json!({"title": "Quarterly"}).into();

    let out = render(&template, &data);
    assert_eq!(cells(&out.bytes, SHEET1)["A1"], text("Quarterly"));

    let package = Package::from_bytes(&out.bytes).unwrap();
    let types = package.read_text("[Content_Types].xml").unwrap();
    assert!(types.contains(r#"PartName="/xl/sharedStrings.xml""#));
    let rels = package.read_text("xl/_rels/workbook.xml.rels").unwrap();
    assert!(rels.contains(r#"Target="sharedStrings.xml""#));
    assert!(rels.contains(r#"Id="rId2""#));
}

#[test]
fn test_rich_text_substitution_escapes_values() {
    let template = {
        let base = TemplateBuilder::new()
            .strings(&["placeholder"])
            .sheet("S", &format!(r#"<row r="1">{}</row>"#, s("A1", 0)), "")
            .build();
        // Swap in a rich-text entry
        let mut package = Package::from_bytes(&base).unwrap();
        package.write_text(
            "xl/sharedStrings.xml",
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="1" uniqueCount="1"><si><r><rPr><b/></rPr><t xml:space="preserve">Client: </t></r><r><t>${client}</t></r></si></sst>"#,
        );
        package.finalize().unwrap()
    };
    let data: Value = serde_json::json!({"client": "Smith & <Sons>"}).into();

    let out = render(&template, &data);
    assert_eq!(
        cells(&out.bytes, SHEET1)["A1"],
        text("Client: Smith & <Sons>")
    );
    let sst = part(&out.bytes, "xl/sharedStrings.xml");
    assert!(sst.root.child("si").unwrap().child("r").unwrap().has_child("rPr"));
}

#[test]
fn test_placeholder_inventory() {
    let template = TemplateBuilder::new()
        .strings(&["${b}", "plain", "${a} and ${b}", "${table:rows.x}"])
        .sheet(
            "S",
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>${c}</t></is></c></row>"#,
            "",
        )
        .build();

    assert_eq!(
        TemplateRenderer::placeholders(&template).unwrap(),
        vec!["b", "a", "table:rows.x", "c"]
    );
}
