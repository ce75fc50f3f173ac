//! Rendering a whole template package

use log::debug;
use stencil_sheets_core::placeholder::find_placeholders;
use stencil_sheets_core::Value;

use crate::error::{XlsxError, XlsxResult};
use crate::package::Package;
use crate::shared_strings::{item_text, SharedStringTable};
use crate::workbook::{
    register_shared_strings, sheet_entries, shift_defined_names, shift_tables, SheetEntry,
    SHARED_STRINGS_PATH, WORKBOOK_PATH,
};
use crate::worksheet::{inline_texts, WorksheetExpander};
use crate::xml::{self, Document};

/// Options controlling a render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Drop cached `<v>` values of formula cells so they are recalculated
    /// on open
    pub remove_formula_values: bool,
    /// Move merged cells, defined names, tables, filters, hyperlinks and
    /// validation ranges after rows or columns were inserted
    pub shift_ranges: bool,
    /// Move the worksheet `<dimension>` the same way
    pub update_dimension: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            remove_formula_values: true,
            shift_ranges: true,
            update_dimension: true,
        }
    }
}

impl RenderOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set whether cached formula values are removed
    pub fn remove_formula_values(mut self, value: bool) -> Self {
        self.remove_formula_values = value;
        self
    }

    /// Builder: set whether ranges are shifted
    pub fn shift_ranges(mut self, value: bool) -> Self {
        self.shift_ranges = value;
        self
    }

    /// Builder: set whether the dimension is updated
    pub fn update_dimension(mut self, value: bool) -> Self {
        self.update_dimension = value;
        self
    }
}

/// Statistics for one worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReport {
    /// Sheet name
    pub name: String,
    /// Part path inside the package
    pub path: String,
    /// Rows in the template
    pub rows_in: usize,
    /// Rows emitted
    pub rows_out: usize,
}

/// Statistics for a whole render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// One entry per worksheet, in workbook order
    pub sheets: Vec<SheetReport>,
    /// Shared strings appended to the table
    pub strings_added: usize,
}

/// Output of a render
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The rendered `.xlsx` package
    pub bytes: Vec<u8>,
    /// What happened along the way
    pub report: RenderReport,
}

/// Template renderer
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Fill `template` (bytes of an `.xlsx` package) with `data`
    pub fn render(template: &[u8], data: &Value, options: &RenderOptions) -> XlsxResult<Rendered> {
        let mut package = Package::from_bytes(template)?;
        let sheets = Self::worksheets(&package)?;

        let strings_doc = if package.contains(SHARED_STRINGS_PATH) {
            Some(parse_part(&package, SHARED_STRINGS_PATH)?)
        } else {
            None
        };
        let mut strings = SharedStringTable::build(strings_doc, data);

        let mut workbook_xml = if package.contains(WORKBOOK_PATH) {
            Some(package.read_text(WORKBOOK_PATH)?)
        } else {
            None
        };
        let mut workbook_changed = false;

        let mut report = RenderReport::default();

        for sheet in sheets {
            let template_doc = parse_part(&package, &sheet.path)?;
            let expanded = WorksheetExpander::new(&mut strings, data, options).expand(&template_doc);
            package.write_text(&sheet.path, &expanded.document.to_xml());

            if options.shift_ranges && !expanded.insertions.is_empty() {
                if let Some(text) = workbook_xml.as_mut() {
                    if let Some(shifted) =
                        shift_defined_names(text, &sheet.name, &expanded.insertions)?
                    {
                        *text = shifted;
                        workbook_changed = true;
                    }
                }
                shift_tables(&mut package, &sheet.path, &expanded.insertions)?;
            }

            debug!(
                "sheet {:?}: {} rows -> {} rows",
                sheet.name, expanded.rows_in, expanded.rows_out
            );
            report.sheets.push(SheetReport {
                name: sheet.name,
                path: sheet.path,
                rows_in: expanded.rows_in,
                rows_out: expanded.rows_out,
            });
        }

        if let Some(text) = workbook_xml.filter(|_| workbook_changed) {
            package.write_text(WORKBOOK_PATH, &text);
        }

        if strings.is_needed() {
            if !package.contains(SHARED_STRINGS_PATH) {
                register_shared_strings(&mut package)?;
            }
            package.write_text(SHARED_STRINGS_PATH, &strings.to_document().to_xml());
        }
        report.strings_added = strings.added_len();

        let bytes = package.finalize()?;
        Ok(Rendered { bytes, report })
    }

    /// Every distinct placeholder body in the template, in first-seen order:
    /// shared strings first, then inline strings sheet by sheet
    pub fn placeholders(template: &[u8]) -> XlsxResult<Vec<String>> {
        let package = Package::from_bytes(template)?;
        let sheets = Self::worksheets(&package)?;

        let mut texts = Vec::new();
        if package.contains(SHARED_STRINGS_PATH) {
            let doc = parse_part(&package, SHARED_STRINGS_PATH)?;
            texts.extend(doc.root.elements().filter(|e| e.name == "si").map(item_text));
        }
        for sheet in &sheets {
            texts.extend(inline_texts(&parse_part(&package, &sheet.path)?));
        }

        let mut bodies: Vec<String> = Vec::new();
        for text in &texts {
            for placeholder in find_placeholders(text) {
                if !bodies.iter().any(|b| b == placeholder.body) {
                    bodies.push(placeholder.body.to_string());
                }
            }
        }

        Ok(bodies)
    }

    fn worksheets(package: &Package) -> XlsxResult<Vec<SheetEntry>> {
        let sheets = sheet_entries(package)?;
        if sheets.is_empty() {
            return Err(XlsxError::InvalidFormat("template has no worksheets".into()));
        }
        Ok(sheets)
    }
}

/// Parse a part, naming it in the error
fn parse_part(package: &Package, path: &str) -> XlsxResult<Document> {
    let text = package.read_text(path)?;
    xml::parse(&text).map_err(|err| XlsxError::Parse(format!("{path}: {err}")))
}
