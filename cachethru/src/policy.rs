//! Cache policy model
//!
//! A policy is a fixed triple of permissions: whether a call may serve a
//! fresh cached value, whether it may fall back to a stale value when the
//! upstream fails, and whether a fresh network result may be stored.

use serde::{Deserialize, Serialize};

/// Per-call caching behavior
///
/// `Unspecified` is the configuration-surface placeholder: a method whose
/// declared policy is `Unspecified` (or absent) behaves as `IgnoreCache`,
/// and an `Unspecified` global override simply defers to the per-method
/// declaration. The policy attached to a resolved call is never
/// `Unspecified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Serve fresh cached values, fall back to stale ones, store results
    PreferCache,
    /// Always call through, but fall back to the cache on failure and
    /// store fresh results
    PreferNetwork,
    /// Bypass the cache entirely
    IgnoreCache,
    /// Never serve from the cache, but store fresh results
    StoreOnly,
    /// No policy declared; behaves as `IgnoreCache` when resolved
    #[default]
    Unspecified,
}

impl CachePolicy {
    /// Whether a fresh cached value may be served instead of calling through
    pub fn can_read_fresh(self) -> bool {
        matches!(self, Self::PreferCache)
    }

    /// Whether a stored value of any age may be served after an upstream
    /// failure
    pub fn can_read_stale(self) -> bool {
        matches!(self, Self::PreferCache | Self::PreferNetwork)
    }

    /// Whether a fresh network result may be persisted
    pub fn can_store(self) -> bool {
        matches!(self, Self::PreferCache | Self::PreferNetwork | Self::StoreOnly)
    }

    /// Whether this is a concrete policy rather than the placeholder
    pub fn is_specified(self) -> bool {
        !matches!(self, Self::Unspecified)
    }

    /// Collapse the placeholder into its effective behavior
    pub fn normalize(self) -> Self {
        match self {
            Self::Unspecified => Self::IgnoreCache,
            other => other,
        }
    }
}
