//! Prelude module - common imports for stencil-sheets users
//!
//! ```rust
//! use stencil_sheets::prelude::*;
//! ```

pub use crate::{
    // Data
    Accessor,
    CellContent,
    // Error types
    Error,
    // Rendering
    RenderOptions,
    RenderReport,
    Rendered,
    Result,
    // Main types
    Template,
    TemplateSource,
    Value,
};
