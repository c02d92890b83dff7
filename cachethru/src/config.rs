//! Layered configuration for the call cache
//!
//! Mirrors the builder surface declaratively: an override policy, a
//! store backend selection, and per-method policy/expiration settings,
//! loaded from defaults, a TOML file, and `CACHETHRU_*` environment
//! variables in that order of precedence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::method::MethodConfig;
use crate::policy::CachePolicy;
use crate::store::StoreConfig;

/// Declarative cache configuration
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct CacheConfig {
    /// Global policy; when specified it supersedes every per-method policy
    #[serde(default)]
    pub override_policy: CachePolicy,

    #[serde(default)]
    pub store: StoreConfig,

    /// Per-method settings, keyed by call identity
    #[serde(default)]
    pub methods: BTreeMap<String, MethodSettings>,
}

/// Declared policy and expiration for one method
#[derive(Deserialize, Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MethodSettings {
    #[serde(default)]
    pub policy: CachePolicy,

    /// Freshness window in milliseconds; 0 means entries are always stale
    #[serde(default)]
    pub expiration_ms: u64,
}

impl MethodSettings {
    pub fn to_method_config(self) -> MethodConfig {
        MethodConfig::new(self.policy).expires_after(Duration::from_millis(self.expiration_ms))
    }
}

/// Loads configuration from XDG-compliant paths with layered priority
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader reading from the platform config directory
    pub fn new() -> Self {
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cachethru/config.toml");

        Self { config_path }
    }

    /// Create a loader with a specific path (for testing)
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    pub fn load(&self) -> Result<CacheConfig, ConfigError> {
        let mut figment = Figment::new();

        // Layer 1: Defaults
        figment = figment.merge(Serialized::defaults(CacheConfig::default()));

        // Layer 2: Config file (if exists)
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        // Layer 3: Environment variables
        figment = figment.merge(Env::prefixed("CACHETHRU_").split("__"));

        Ok(figment.extract()?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_settings_map_onto_method_config() {
        let settings = MethodSettings {
            policy: CachePolicy::PreferCache,
            expiration_ms: 60_000,
        };

        let config = settings.to_method_config();
        assert_eq!(config.policy(), CachePolicy::PreferCache);
        assert_eq!(config.expiration_millis(), 60_000);
    }

    #[test]
    fn test_default_settings_declare_no_policy() {
        let config = MethodSettings::default().to_method_config();

        assert_eq!(config.policy(), CachePolicy::Unspecified);
        assert_eq!(config.expiration_millis(), 0);
    }

    #[test]
    fn test_default_config_shape() {
        let config = CacheConfig::default();

        assert_eq!(config.override_policy, CachePolicy::Unspecified);
        assert_eq!(config.store, StoreConfig::Fs { dir: None });
        assert!(config.methods.is_empty());
    }
}
