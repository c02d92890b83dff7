//! No-op store implementation
//!
//! This module provides a store that remembers nothing. Reads always
//! report a missing entry and writes are accepted and discarded. Useful
//! for disabling persistence without touching call sites.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::key::CacheKey;
use crate::store::traits::{ReadHandle, Store, WriteHandle};

/// Store that accepts writes and never returns an entry
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

#[async_trait]
impl Store for NoopStore {
    async fn open_write(&self, _key: &CacheKey) -> Result<Box<dyn WriteHandle>, StoreError> {
        Ok(Box::new(NoopWriteHandle { committed: false }))
    }

    async fn open_read(&self, key: &CacheKey) -> Result<Box<dyn ReadHandle>, StoreError> {
        Err(StoreError::not_found(key.as_str()))
    }

    async fn created_at_millis(&self, key: &CacheKey) -> Result<i64, StoreError> {
        Err(StoreError::not_found(key.as_str()))
    }
}

struct NoopWriteHandle {
    committed: bool,
}

#[async_trait]
impl WriteHandle for NoopWriteHandle {
    async fn write_all(&mut self, _bytes: &[u8]) -> Result<(), StoreError> {
        if self.committed {
            return Err(StoreError::Released);
        }

        Ok(())
    }

    async fn commit(&mut self, _created_at_millis: i64) -> Result<(), StoreError> {
        if self.committed {
            return Err(StoreError::Released);
        }

        self.committed = true;
        Ok(())
    }
}
