//! Error types for the stencil-sheets facade

use thiserror::Error;

/// Result type for template operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Template`](crate::Template)
#[derive(Debug, Error)]
pub enum Error {
    /// The template bytes could not be obtained
    #[error("Cannot read template from {location}: {reason}")]
    Source {
        /// Path or URL
        location: String,
        /// What went wrong
        reason: String,
    },

    /// The data context is not valid JSON
    #[error("Invalid data: {0}")]
    Data(#[from] serde_json::Error),

    /// Rendering failed
    #[error(transparent)]
    Xlsx(#[from] stencil_sheets_xlsx::XlsxError),

    /// Writing the output failed
    #[error("Cannot write {path}: {source}")]
    Output {
        /// Output path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
}
