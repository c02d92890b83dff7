//! Error types for the cachethru library
//!
//! This module contains all error types used throughout the library, organized
//! into logical categories for better maintainability and clarity.

use thiserror::Error;

pub mod codec;
pub mod config;
pub mod store;

pub use self::codec::CodecError;
pub use self::config::ConfigError;
pub use self::store::StoreError;

/// Result type alias for decorated calls
pub type CallResult<T, E> = std::result::Result<T, CallError<E>>;

/// Error type returned by a decorated call
///
/// A decorated call fails in one of two ways:
/// - Config errors: the call never reached the upstream because its setup
///   was invalid (no store attached, payload type mismatch, arguments that
///   cannot be serialized)
/// - Upstream errors: the upstream call itself failed and no cached entry
///   was allowed to stand in for it
///
/// Store and codec failures never surface here. They degrade the call to
/// a cache miss or skip persistence, and the call proceeds.
#[derive(Error, Debug)]
pub enum CallError<E> {
    /// Call setup or configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The upstream call failed and no fallback entry was served
    #[error("Upstream call failed: {0}")]
    Upstream(E),
}

impl<E> CallError<E> {
    /// Check if this error originated in the upstream call
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }

    /// Check if this error originated in call setup
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Extract the original upstream error, if there is one
    pub fn into_upstream(self) -> Option<E> {
        match self {
            Self::Upstream(source) => Some(source),
            Self::Config(_) => None,
        }
    }
}
