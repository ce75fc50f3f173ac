//! Merged cells, defined names and tables after insertions

use pretty_assertions::assert_eq;
use stencil_sheets_core::Value;

use crate::*;

const SHEET1: &str = "xl/worksheets/sheet1.xml";

fn people() -> Value {
    serde_json::json!({
        "people": [
            {"name": "Ada", "age": 36},
            {"name": "Grace", "age": 45},
            {"name": "Edsger", "age": 72}
        ]
    })
    .into()
}

fn table_template(tail: &str) -> TemplateBuilder {
    TemplateBuilder::new()
        .strings(&["Title", "${table:people.name}", "${table:people.age}", "Footer"])
        .sheet(
            "Data",
            &format!(
                r#"<row r="1">{}</row><row r="2">{}{}</row><row r="4">{}</row>"#,
                s("A1", 0),
                s("A2", 1),
                s("B2", 2),
                s("A4", 3)
            ),
            tail,
        )
}

fn merges(bytes: &[u8]) -> Vec<String> {
    part(bytes, SHEET1)
        .root
        .child("mergeCells")
        .unwrap()
        .elements()
        .map(|m| m.attr("ref").unwrap().to_string())
        .collect()
}

#[test]
fn test_merged_cells_below_table_move_down() {
    let template = table_template(
        r#"<mergeCells count="2"><mergeCell ref="A1:B1"/><mergeCell ref="A4:B5"/></mergeCells>"#,
    )
    .build();

    let out = render(&template, &people());
    assert_eq!(merges(&out.bytes), vec!["A1:B1", "A6:B7"]);

    let cells = cells(&out.bytes, SHEET1);
    assert_eq!(cells["A6"], text("Footer"));
    assert_eq!(cells["A4"], text("Edsger"));
    assert_eq!(cells["B4"], number("72"));
}

#[test]
fn test_merge_inside_table_row_repeats() {
    let template = table_template(r#"<mergeCells count="1"><mergeCell ref="B2:C2"/></mergeCells>"#)
        .build();

    let out = render(&template, &people());
    assert_eq!(merges(&out.bytes), vec!["B2:C2", "B3:C3", "B4:C4"]);
}

#[test]
fn test_merged_cells_right_of_columns_move_right() {
    let template = TemplateBuilder::new()
        .strings(&["${months}", "Total"])
        .sheet(
            "Data",
            &format!(r#"<row r="1">{}{}</row>"#, s("A1", 0), s("B1", 1)),
            r#"<mergeCells count="1"><mergeCell ref="B1:C1"/></mergeCells>"#,
        )
        .build();
    let data: Value = serde_json::json!({"months": ["Jan", "Feb", "Mar"]}).into();

    let out = render(&template, &data);
    assert_eq!(merges(&out.bytes), vec!["D1:E1"]);
    assert_eq!(cells(&out.bytes, SHEET1)["D1"], text("Total"));
}

#[test]
fn test_merge_holding_an_array_keeps_its_width() {
    let template = TemplateBuilder::new()
        .strings(&["${months}"])
        .sheet(
            "Data",
            &format!(r#"<row r="1">{}</row>"#, s("A1", 0)),
            r#"<mergeCells count="1"><mergeCell ref="A1:B1"/></mergeCells>"#,
        )
        .build();
    let data: Value = serde_json::json!({"months": ["Jan", "Feb", "Mar"]}).into();

    let out = render(&template, &data);
    assert_eq!(merges(&out.bytes), vec!["C1:D1"]);
    let cells = cells(&out.bytes, SHEET1);
    assert_eq!(cells["A1"], text("Jan"));
    assert_eq!(cells["B1"], text("Feb"));
    assert_eq!(cells["C1"], text("Mar"));
}

#[test]
fn test_shared_formula_below_table_moves_with_its_range() {
    let template = TemplateBuilder::new()
        .strings(&["${table:people.name}"])
        .sheet(
            "Data",
            &format!(
                r#"<row r="1">{}</row><row r="3"><c r="B3"><f t="shared" ref="B3:B4" si="0">A3*2</f></c></row><row r="4"><c r="B4"><f t="shared" si="0"/></c></row>"#,
                s("A1", 0)
            ),
            "",
        )
        .build();

    let out = render(&template, &people());
    let cells = cells(&out.bytes, SHEET1);
    assert_eq!(cells["B5"], Cell::Formula("A3*2".into()));
    assert_eq!(cells["B6"], Cell::Formula(String::new()));

    let sheet = part(&out.bytes, SHEET1);
    let master = sheet
        .root
        .child("sheetData")
        .unwrap()
        .elements()
        .flat_map(|row| row.elements())
        .find(|c| c.attr("r") == Some("B5"))
        .unwrap();
    assert_eq!(master.child("f").unwrap().attr("ref"), Some("B5:B6"));
}

#[test]
fn test_defined_names_follow_the_table() {
    let template = table_template("")
        .defined_name("People", "Data!$A$2:$B$2")
        .defined_name("Footer", "'Data'!$A$4")
        .build();

    let out = render(&template, &people());
    let workbook = part(&out.bytes, "xl/workbook.xml");
    let names: Vec<(String, String)> = workbook
        .root
        .child("definedNames")
        .unwrap()
        .elements()
        .map(|n| (n.attr("name").unwrap().to_string(), n.text()))
        .collect();

    assert_eq!(
        names,
        vec![
            ("People".to_string(), "Data!$A$2:$B$4".to_string()),
            ("Footer".to_string(), "'Data'!$A$6".to_string()),
        ]
    );
}

#[test]
fn test_table_part_grows() {
    let template = table_template("")
        .table(
            "xl/tables/table1.xml",
            r#"<table xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" id="1" name="People" displayName="People" ref="A1:B2"><autoFilter ref="A1:B2"/><tableColumns count="2"><tableColumn id="1" name="Name"/><tableColumn id="2" name="Age"/></tableColumns></table>"#,
        )
        .build();

    let out = render(&template, &people());
    let table = part(&out.bytes, "xl/tables/table1.xml");
    assert_eq!(table.root.attr("ref"), Some("A1:B4"));
    assert_eq!(table.root.child("autoFilter").unwrap().attr("ref"), Some("A1:B4"));
}

#[test]
fn test_dimension_and_validations() {
    let template = table_template(
        r#"<dataValidations count="1"><dataValidation type="whole" sqref="B2"><formula1>0</formula1></dataValidation></dataValidations>"#,
    )
    .build();
    // Put a dimension in front of sheetData
    let template = {
        let mut package = stencil_sheets_xlsx::Package::from_bytes(&template).unwrap();
        let sheet = package.read_text(SHEET1).unwrap();
        package.write_text(
            SHEET1,
            &sheet.replace("<sheetData>", r#"<dimension ref="A1:B4"/><sheetData>"#),
        );
        package.finalize().unwrap()
    };

    let out = render(&template, &people());
    let sheet = part(&out.bytes, SHEET1);
    assert_eq!(sheet.root.child("dimension").unwrap().attr("ref"), Some("A1:B6"));
    assert_eq!(
        sheet
            .root
            .child("dataValidations")
            .unwrap()
            .child("dataValidation")
            .unwrap()
            .attr("sqref"),
        Some("B2:B4")
    );
}
