//! End-to-end tests for stencil-sheets-xlsx.
//!
//! Each test builds the template it needs in memory with the `zip` writer,
//! renders it, and reads the produced package back.

mod common;
mod errors;
mod expansion;
mod ranges;
mod strings;

// Re-export common utilities for submodules
pub use common::*;
