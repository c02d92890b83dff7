//! Configuration and call setup error types

use thiserror::Error;

use super::StoreError;

/// Errors raised while configuring the cache or preparing a call
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The builder was finalized without a store attached
    #[error("Cache store is not set")]
    MissingStore,

    /// A call requested a payload type other than the one registered
    /// for its method
    #[error(
        "Payload type mismatch for method '{method}': registered '{registered}', requested '{requested}'"
    )]
    PayloadMismatch {
        method: String,
        registered: &'static str,
        requested: &'static str,
    },

    /// Call arguments could not be serialized into a cache key source
    #[error("Failed to serialize arguments for method '{method}': {source}")]
    InvalidArguments {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration sources could not be read or merged
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    /// The configured store backend could not be created
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConfigError {
    /// Create a payload mismatch error
    pub fn payload_mismatch(
        method: impl Into<String>,
        registered: &'static str,
        requested: &'static str,
    ) -> Self {
        Self::PayloadMismatch {
            method: method.into(),
            registered,
            requested,
        }
    }

    /// Create an invalid arguments error
    pub fn invalid_arguments(method: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidArguments {
            method: method.into(),
            source,
        }
    }
}
