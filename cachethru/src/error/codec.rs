//! Payload codec error types

use thiserror::Error;

/// Errors produced while encoding or decoding cached payloads
///
/// Decode errors are expected in the wild: a cached entry may have been
/// written by an older build with a different payload layout. Callers
/// treat them as a cache miss, not a failure.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Payload could not be serialized for storage
    #[error("Failed to encode payload for method '{method}': {source}")]
    Encode {
        method: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Stored bytes could not be deserialized back into the payload type
    #[error("Failed to decode cached payload for method '{method}': {source}")]
    Decode {
        method: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CodecError {
    /// Create an encode error for the given method
    pub fn encode(
        method: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Encode {
            method: method.into(),
            source: Box::new(source),
        }
    }

    /// Create a decode error for the given method
    pub fn decode(
        method: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            method: method.into(),
            source: Box::new(source),
        }
    }
}
