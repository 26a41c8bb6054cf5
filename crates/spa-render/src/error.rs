//! Error types for rendering.

use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering a document.
///
/// Render fails on the first error; no partial audio is returned.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The XML input failed to parse (only from [`crate::render_str`]).
    #[error(transparent)]
    Parse(#[from] spa_doc::ParseError),

    /// A required value is out of its declared range.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name, e.g. `"tone.freq"`.
        name: String,
        /// What went wrong.
        message: String,
    },

    /// An envelope reference survived parsing but has no `defs` entry.
    #[error("envelope reference '#{id}' does not match any entry in 'defs'")]
    UnresolvedReference { id: String },
}

impl RenderError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}
