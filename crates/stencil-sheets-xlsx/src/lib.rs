//! # stencil-sheets-xlsx
//!
//! XLSX template expansion for stencil-sheets: unpacks a template package,
//! rebuilds its shared strings and worksheets against a data context, shifts
//! dependent ranges and packs the result.

pub mod error;
pub mod package;
pub mod render;
pub mod shared_strings;
pub mod workbook;
pub mod worksheet;
pub mod xml;

pub use error::{XlsxError, XlsxResult};
pub use package::Package;
pub use render::{RenderOptions, RenderReport, Rendered, SheetReport, TemplateRenderer};
pub use shared_strings::{EntryPlan, SharedStringTable};
pub use worksheet::{ExpandedSheet, OffsetState, RowPlan, Slot, WorksheetExpander};
