//! Cache key derivation
//!
//! Keys are a pure function of call identity and canonicalized arguments.
//! They must be stable across processes and restarts, so derivation never
//! looks at the clock, the policy, or the store.

use std::fmt;

use crate::context::CallContext;

/// Opaque store address for one (method, arguments) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy for mapping a resolved call onto a store address
///
/// Implementations must be pure and deterministic: the same method and
/// arguments always derive the same key, on any host, at any time.
/// Collisions degrade cache correctness only, never safety.
pub trait KeyGenerator: Send + Sync {
    fn derive(&self, context: &CallContext) -> CacheKey;
}

impl<F> KeyGenerator for F
where
    F: Fn(&CallContext) -> CacheKey + Send + Sync,
{
    fn derive(&self, context: &CallContext) -> CacheKey {
        self(context)
    }
}

/// Default derivation: crc32 of the method identity and crc32 of the
/// canonical argument JSON, as two fixed-width hex words
///
/// `serde_json::Value` renders maps in sorted key order, so the argument
/// bytes hashed here are canonical across processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyGenerator;

impl KeyGenerator for DefaultKeyGenerator {
    fn derive(&self, context: &CallContext) -> CacheKey {
        let identity = crc32fast::hash(context.method().as_bytes());
        let args = crc32fast::hash(context.args().to_string().as_bytes());

        CacheKey::new(format!("{identity:08x}{args:08x}"))
    }
}
