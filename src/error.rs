//! Error types for the repacking library.
//!
//! This module defines all error types that can occur while decoding stream
//! data, walking the page tree or running the optimizer.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document restructuring.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Encoded stream content violates the filter's format
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A value does not have the structure an operation requires
    #[error("Structural mismatch: expected {expected}, found {found}")]
    StructuralMismatch {
        /// What the operation needed
        expected: String,
        /// What was actually there
        found: String,
    },

    /// Content stream tokenization failed at a specific byte offset
    #[error("Failed to parse content at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where the error occurred
        offset: usize,
        /// Reason for the failure
        reason: String,
    },

    /// A mutation addressed a reference with no effective value
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// A revision index outside the document's history
    #[error("Revision not found: {0}")]
    RevisionNotFound(usize),

    /// Stream filter without a registered codec
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Optimization options failed validation
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Optimization options could not be deserialized
    #[error("Invalid options JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::StructuralMismatch`].
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::StructuralMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
