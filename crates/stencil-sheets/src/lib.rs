//! # stencil-sheets
//!
//! Fill `.xlsx` templates with data.
//!
//! A template is an ordinary workbook whose cells contain placeholders:
//!
//! - `${customer.name}` is replaced by the value at that path
//! - `${months}` holding an array spreads into adjacent columns
//! - `${table:orders.total}` repeats its row once per array element
//!
//! Merged cells, defined names, tables and other ranges below or to the
//! right of inserted rows and columns move along with the cells.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stencil_sheets::prelude::*;
//!
//! let template = Template::open("invoice.xlsx")?;
//! let data = Value::from(serde_json::json!({
//!     "customer": {"name": "Ada"},
//!     "orders": [{"total": 12.5}, {"total": 7}]
//! }));
//!
//! let rendered = template.render_to_file(&data, "out.xlsx")?;
//! println!("{} new strings", rendered.report.strings_added);
//! # Ok::<(), stencil_sheets::Error>(())
//! ```

pub mod error;
pub mod prelude;
pub mod source;
pub mod template;

pub use error::{Error, Result};
pub use source::TemplateSource;
pub use template::Template;

// Re-export core types
pub use stencil_sheets_core::{
    classify, Accessor, CellAddress, CellContent, CellRange, Insertions, Segment, Value, MAX_COLS,
    MAX_ROWS,
};

// Re-export rendering types
pub use stencil_sheets_xlsx::{
    RenderOptions, RenderReport, Rendered, SheetReport, TemplateRenderer, XlsxError,
};
