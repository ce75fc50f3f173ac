//! # stencil-sheets-core
//!
//! Format-independent building blocks of the stencil-sheets template engine:
//! - [`Accessor`] - parsed `${...}` placeholder bodies
//! - [`placeholder`] - finding placeholders inside cell text
//! - [`Value`] and [`resolve`] - the data context and path resolution
//! - [`classify`] - choosing a cell type for a resolved value
//! - [`reference`] - column letters, A1 addresses and ranges
//! - [`Insertions`] - moving references after rows/columns were inserted
//!
//! ## Example
//!
//! ```rust
//! use stencil_sheets_core::{classify, Accessor, CellContent, Value};
//!
//! let data: Value = serde_json::json!({
//!     "people": [{"name": "Ada"}, {"name": "Grace"}]
//! })
//! .into();
//!
//! let accessor = Accessor::parse("table:people.name");
//! assert!(accessor.is_table());
//!
//! let names = data.resolve(&accessor).unwrap();
//! assert_eq!(names, Value::from(vec!["Ada", "Grace"]));
//! assert_eq!(
//!     classify(Some(&Value::from("Ada"))),
//!     Some(CellContent::Text("Ada".into()))
//! );
//! ```

pub mod accessor;
pub mod classify;
pub mod data;
pub mod error;
pub mod placeholder;
pub mod reference;
pub mod shift;

// Re-exports for convenience
pub use accessor::{Accessor, Segment};
pub use classify::{classify, excel_serial, to_text, CellContent};
pub use data::{resolve, Value};
pub use error::{Error, Result};
pub use reference::{cell_ref, index_to_letters, letters_to_index, CellAddress, CellRange};
pub use shift::Insertions;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
