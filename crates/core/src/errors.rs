//! Error types shared across LiftSync crates.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the document layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The persisted document exists but cannot be parsed.
    #[error("Stored document is corrupt: {0}")]
    CorruptData(String),

    /// Underlying read/write failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Caller supplied something the operation cannot accept.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True when the failure came from unreadable persisted state rather than I/O.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::CorruptData(_))
    }
}
