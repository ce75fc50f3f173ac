//! Scalar, column and table expansion

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use stencil_sheets_core::Value;
use stencil_sheets_xlsx::{RenderOptions, TemplateRenderer};

use crate::*;

const SHEET1: &str = "xl/worksheets/sheet1.xml";

#[test]
fn test_date_becomes_excel_serial() {
    let template = TemplateBuilder::new()
        .strings(&["${extractDate}"])
        .sheet("Report", &format!(r#"<row r="1">{}</row>"#, s("A1", 0)), "")
        .build();
    let data = Value::mapping([(
        "extractDate",
        Value::from(NaiveDate::from_ymd_opt(2013, 6, 1).unwrap()),
    )]);

    let first = render(&template, &data);
    assert_eq!(cells(&first.bytes, SHEET1)["A1"], number("41426"));

    // Same input, same cell
    let second = render(&template, &data);
    assert_eq!(cells(&second.bytes, SHEET1), cells(&first.bytes, SHEET1));
}

#[test]
fn test_array_expands_into_columns() {
    let template = TemplateBuilder::new()
        .strings(&["${dates}", "static"])
        .sheet(
            "Report",
            &format!(r#"<row r="1">{}{}</row>"#, s("A1", 0), s("B1", 1)),
            "",
        )
        .build();
    let data: Value = serde_json::json!({"dates": ["2024-01-01", "2024-02-01", "2024-03-01"]})
        .into();

    let out = render(&template, &data.parse_dates());
    let cells = cells(&out.bytes, SHEET1);

    assert_eq!(cells.len(), 4);
    assert_eq!(cells["A1"], number("45292"));
    assert_eq!(cells["B1"], number("45323"));
    assert_eq!(cells["C1"], number("45352"));
    assert_eq!(cells["D1"], text("static"));
}

#[test]
fn test_table_rows() {
    let template = TemplateBuilder::new()
        .strings(&["Name", "Age", "${table:people.name}", "${table:people.age}", "Total"])
        .sheet(
            "People",
            &format!(
                r#"<row r="1">{}{}</row><row r="2">{}{}</row><row r="3">{}</row>"#,
                s("A1", 0),
                s("B1", 1),
                s("A2", 2),
                s("B2", 3),
                s("A3", 4)
            ),
            "",
        )
        .build();
    let data: Value = serde_json::json!({
        "people": [{"name": "Ada", "age": 36}, {"name": "Grace", "age": 45}]
    })
    .into();

    let out = render(&template, &data);
    let cells = cells(&out.bytes, SHEET1);

    assert_eq!(cells["A2"], text("Ada"));
    assert_eq!(cells["B2"], number("36"));
    assert_eq!(cells["A3"], text("Grace"));
    assert_eq!(cells["B3"], number("45"));
    assert_eq!(cells["A4"], text("Total"));
    assert_eq!(cells.len(), 7);

    assert_eq!(out.report.sheets.len(), 1);
    assert_eq!(out.report.sheets[0].name, "People");
    assert_eq!(out.report.sheets[0].rows_in, 3);
    assert_eq!(out.report.sheets[0].rows_out, 4);
}

#[test]
fn test_mixed_text_and_missing_values() {
    let template = TemplateBuilder::new()
        .strings(&["Dear ${name},", "${nothing}", "${flag}"])
        .sheet(
            "Letter",
            &format!(r#"<row r="1">{}{}{}</row>"#, s("A1", 0), s("B1", 1), s("C1", 2)),
            "",
        )
        .build();
    let data: Value = serde_json::json!({"name": "Ada", "flag": false}).into();

    let out = render(&template, &data);
    let cells = cells(&out.bytes, SHEET1);

    assert_eq!(cells["A1"], text("Dear Ada,"));
    assert_eq!(cells["B1"], Cell::Empty);
    assert_eq!(cells["C1"], Cell::Bool("0".into()));
}

#[test]
fn test_formula_cells_lose_cached_values() {
    let template = TemplateBuilder::new()
        .strings(&["${n}"])
        .sheet(
            "Calc",
            &format!(
                r#"<row r="1">{}<c r="B1"><f>A1*2</f><v>0</v></c></row>"#,
                s("A1", 0)
            ),
            "",
        )
        .build();
    let data: Value = serde_json::json!({"n": 21}).into();

    let out = render(&template, &data);
    let sheet = part(&out.bytes, SHEET1);
    let b1 = sheet
        .root
        .child("sheetData")
        .unwrap()
        .child("row")
        .unwrap()
        .elements()
        .nth(1)
        .unwrap();
    assert_eq!(b1.child("f").unwrap().text(), "A1*2");
    assert!(!b1.has_child("v"));

    let kept = TemplateRenderer::render(
        &template,
        &data,
        &RenderOptions::default().remove_formula_values(false),
    )
    .unwrap();
    let sheet = part(&kept.bytes, SHEET1);
    let row = sheet.root.child("sheetData").unwrap().child("row").unwrap();
    assert!(row.elements().nth(1).unwrap().has_child("v"));
}

#[test]
fn test_every_sheet_is_rendered() {
    let template = TemplateBuilder::new()
        .strings(&["${a}", "${b}"])
        .sheet("One", &format!(r#"<row r="1">{}</row>"#, s("A1", 0)), "")
        .sheet("Two", &format!(r#"<row r="1">{}</row>"#, s("A1", 1)), "")
        .build();
    let data: Value = serde_json::json!({"a": "first", "b": "second"}).into();

    let out = render(&template, &data);
    assert_eq!(cells(&out.bytes, SHEET1)["A1"], text("first"));
    assert_eq!(
        cells(&out.bytes, "xl/worksheets/sheet2.xml")["A1"],
        text("second")
    );
}
