//! Cache store error types

use thiserror::Error;

/// Errors surfaced by cache store backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// No committed entry exists for the requested key
    #[error("No entry for key '{key}'")]
    NotFound { key: String },

    /// The handle was already committed or released
    #[error("Handle already released")]
    Released,

    /// Another writer currently holds the slot for this key
    #[error("Write already in flight for key '{key}'")]
    WriterBusy { key: String },

    /// Underlying I/O failure
    #[error("Store I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure
    #[error("Store backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Create a not-found error for the given key
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a writer-busy error for the given key
    pub fn writer_busy(key: impl Into<String>) -> Self {
        Self::WriterBusy { key: key.into() }
    }

    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Check if this error is an ordinary miss rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
