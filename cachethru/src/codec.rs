//! Payload codec contract
//!
//! The codec turns payloads into the opaque bytes the store holds and
//! back. Codec failures are typed separately from store failures so the
//! pipeline can treat an undecodable entry as a miss while still
//! reporting real store trouble.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::context::CallContext;
use crate::error::CodecError;

/// Object⇄bytes conversion for cached payloads
///
/// Implementations receive the call context so diagnostics can name the
/// method, and so a format could vary by payload shape if it ever needs
/// to. Dispatch is static: the codec is a type parameter of the service,
/// defaulting to [`JsonCodec`].
pub trait Codec: Send + Sync {
    fn encode<T: Serialize>(&self, context: &CallContext, payload: &T)
    -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(
        &self,
        context: &CallContext,
        bytes: &[u8],
    ) -> Result<T, CodecError>;
}

/// Default codec: payloads as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        context: &CallContext,
        payload: &T,
    ) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(payload).map_err(|source| CodecError::encode(context.method(), source))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        context: &CallContext,
        bytes: &[u8],
    ) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|source| CodecError::decode(context.method(), source))
    }
}
