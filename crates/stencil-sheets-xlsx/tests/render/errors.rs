//! Input contract violations

use stencil_sheets_core::Value;
use stencil_sheets_xlsx::{RenderOptions, TemplateRenderer, XlsxError};

use crate::*;

#[test]
fn test_empty_template_rejected() {
    let result = TemplateRenderer::render(&[], &Value::Null, &RenderOptions::default());
    assert!(matches!(result, Err(XlsxError::InvalidFormat(_))));
}

#[test]
fn test_non_zip_rejected() {
    let result = TemplateRenderer::render(b"PK? no", &Value::Null, &RenderOptions::default());
    assert!(matches!(result, Err(XlsxError::Zip(_))));
}

#[test]
fn test_template_without_worksheets_rejected() {
    let template = TemplateBuilder::new().strings(&["x"]).build();
    let result = TemplateRenderer::render(&template, &Value::Null, &RenderOptions::default());
    assert!(matches!(result, Err(XlsxError::InvalidFormat(msg)) if msg.contains("no worksheets")));
}

#[test]
fn test_broken_worksheet_names_the_part() {
    let template = zip_of(&[
        (
            "xl/worksheets/sheet1.xml".to_string(),
            "<worksheet><sheetData></worksheet>".to_string(),
        ),
    ]);
    let result = TemplateRenderer::render(&template, &Value::Null, &RenderOptions::default());
    match result {
        Err(XlsxError::Parse(msg)) => assert!(msg.starts_with("xl/worksheets/sheet1.xml")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_misses_never_fail() {
    let template = TemplateBuilder::new()
        .strings(&["${a.b[3][\"x\"]}", "${[}", "${table:}"])
        .sheet(
            "S",
            &format!(r#"<row r="1">{}{}{}</row>"#, s("A1", 0), s("B1", 1), s("C1", 2)),
            "",
        )
        .build();

    let out = render(&template, &Value::Null);
    let cells = cells(&out.bytes, "xl/worksheets/sheet1.xml");
    assert_eq!(cells["A1"], Cell::Empty);
    assert_eq!(cells["B1"], Cell::Empty);
    assert_eq!(cells["C1"], Cell::Empty);
}
