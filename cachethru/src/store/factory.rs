//! Store factory for creating different store backends
//!
//! This module provides a factory pattern for creating store instances
//! based on configuration, including configuration arriving from the
//! file/env layer.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::traits::Store;
use crate::store::{FsStore, MemoryStore, NoopStore};

/// Configuration for the different store backends
///
/// Serializes with a `backend` tag so a TOML table like
/// `{ backend = "fs", dir = "/tmp/cache" }` selects and parameterizes
/// a backend in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// File-based store; `dir` defaults to the platform cache directory
    Fs {
        #[serde(default)]
        dir: Option<PathBuf>,
    },
    /// In-memory store
    Memory,
    /// No caching
    Noop,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Fs { dir: None }
    }
}

/// Factory for creating store backends
pub struct StoreFactory;

impl StoreFactory {
    /// Create a store backend based on configuration
    pub fn create(config: &StoreConfig) -> Result<Arc<dyn Store>, StoreError> {
        match config {
            StoreConfig::Fs { dir } => {
                let store = match dir {
                    Some(dir) => FsStore::new(dir)?,
                    None => FsStore::in_default_dir()?,
                };
                Ok(Arc::new(store))
            }
            StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreConfig::Noop => Ok(Arc::new(NoopStore)),
        }
    }

    /// Create a file-based store rooted at the given directory
    pub fn fs(dir: impl Into<PathBuf>) -> Result<Arc<dyn Store>, StoreError> {
        Self::create(&StoreConfig::Fs {
            dir: Some(dir.into()),
        })
    }

    /// Create an in-memory store
    pub fn memory() -> Arc<dyn Store> {
        Arc::new(MemoryStore::new())
    }

    /// Create a no-op store
    pub fn noop() -> Arc<dyn Store> {
        Arc::new(NoopStore)
    }
}
