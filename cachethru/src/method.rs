//! Per-method cache registration
//!
//! The dispatch table built at composition time. Each registered method
//! carries a declared policy, an expiration window, and optionally a
//! pinned payload type that call sites are checked against.

use std::any::TypeId;
use std::collections::HashMap;
use std::time::Duration;

use crate::policy::CachePolicy;

/// Declared caching behavior for one method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodConfig {
    policy: CachePolicy,
    expiration: Duration,
}

impl MethodConfig {
    /// Create a config with the given policy and no expiration window
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            expiration: Duration::ZERO,
        }
    }

    /// Set the freshness window for cached entries
    pub fn expires_after(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Expiration window in epoch-comparable milliseconds
    pub fn expiration_millis(&self) -> i64 {
        self.expiration.as_millis() as i64
    }
}

/// The payload type a method was registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadShape {
    type_id: TypeId,
    type_name: &'static str,
}

impl PayloadShape {
    /// Capture the shape of a concrete payload type
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// One registered method: its config plus an optional payload pin
#[derive(Debug, Clone, Copy)]
pub struct MethodEntry {
    config: MethodConfig,
    payload: Option<PayloadShape>,
}

impl MethodEntry {
    /// Register a method without pinning its payload type
    ///
    /// Entries loaded from the file/env configuration layer arrive this
    /// way, since no concrete type is available there.
    pub fn new(config: MethodConfig) -> Self {
        Self {
            config,
            payload: None,
        }
    }

    /// Register a method and pin the payload type call sites must use
    pub fn with_payload<T: 'static>(config: MethodConfig) -> Self {
        Self {
            config,
            payload: Some(PayloadShape::of::<T>()),
        }
    }

    pub fn config(&self) -> MethodConfig {
        self.config
    }

    pub fn payload(&self) -> Option<PayloadShape> {
        self.payload
    }
}

/// Lookup table from method identity to registration
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    entries: HashMap<String, MethodEntry>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the entry for a method
    pub fn insert(&mut self, method: impl Into<String>, entry: MethodEntry) {
        self.entries.insert(method.into(), entry);
    }

    pub fn get(&self, method: &str) -> Option<&MethodEntry> {
        self.entries.get(method)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
