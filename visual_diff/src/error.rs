//! Error taxonomy shared by every stage of a comparison.

use thiserror::Error;

/// Result type alias using DiffError.
pub type Result<T> = std::result::Result<T, DiffError>;

/// Errors that can terminate a comparison. None of them are retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiffError {
    /// Malformed RGB vector, out-of-range threshold, bad buffer or empty image reference.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Both images did not finish loading within the polling budget.
    #[error("some image could not be loaded in the expected time ({attempts} attempts).")]
    Timeout { attempts: u32 },

    /// The loaded images differ in width or height.
    #[error(
        "cannot diff images with different sizes ({}x{} vs {}x{}).",
        base.0, base.1, current.0, current.1
    )]
    DimensionMismatch {
        base: (u32, u32),
        current: (u32, u32),
    },

    /// The image primitive reported an error for a given source.
    #[error("failed to decode image '{reference}': {reason}")]
    DecodeFailure { reference: String, reason: String },
}

impl DiffError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        DiffError::InvalidInput(message.into())
    }

    pub(crate) fn decode(reference: &str, reason: impl ToString) -> Self {
        DiffError::DecodeFailure {
            reference: shorten_reference(reference),
            reason: reason.to_string(),
        }
    }
}

/// Data URLs can be megabytes long; keep error messages readable.
pub(crate) fn shorten_reference(reference: &str) -> String {
    const MAX_REFERENCE_CHARS: usize = 64;
    if reference.chars().count() <= MAX_REFERENCE_CHARS {
        return reference.to_string();
    }
    let head: String = reference.chars().take(MAX_REFERENCE_CHARS).collect();
    format!("{head}...")
}
