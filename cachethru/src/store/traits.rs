//! Store trait definitions
//!
//! This module defines the contract every store backend must implement.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::key::CacheKey;

/// A key-addressed byte store with record-level atomicity
///
/// Backends must guarantee at most one writer in flight per key and must
/// never let a reader observe a partially written entry. Entries carry a
/// creation timestamp in epoch millis, stamped at commit time.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a staged write for the given key
    ///
    /// Returns `StoreError::WriterBusy` while another write for the same
    /// key is in flight. Staged bytes become visible only on commit;
    /// dropping an uncommitted handle discards them and frees the slot.
    async fn open_write(&self, key: &CacheKey) -> Result<Box<dyn WriteHandle>, StoreError>;

    /// Open a read over the committed entry for the given key
    ///
    /// Returns `StoreError::NotFound` when no committed entry exists.
    /// The handle reads a snapshot: a commit racing the read never
    /// changes the bytes an open handle yields.
    async fn open_read(&self, key: &CacheKey) -> Result<Box<dyn ReadHandle>, StoreError>;

    /// Creation timestamp of the committed entry for the given key
    ///
    /// Returns `StoreError::NotFound` when no committed entry exists.
    async fn created_at_millis(&self, key: &CacheKey) -> Result<i64, StoreError>;

    /// Flush and shut down the backend
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Staged write for one entry
///
/// Bytes accumulate invisibly until `commit`, which atomically publishes
/// the entry under its key with the given creation timestamp and makes
/// it durable as far as the backend can. Both methods report
/// `StoreError::Released` once the handle has committed.
#[async_trait]
pub trait WriteHandle: Send {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), StoreError>;

    async fn commit(&mut self, created_at_millis: i64) -> Result<(), StoreError>;
}

/// Read lease over one committed entry
///
/// `release` frees whatever lease or snapshot the backend holds for this
/// handle. It must succeed in freeing the lease even when the read side
/// terminated early, and reports `StoreError::Released` only from
/// `read_to_end` after release.
#[async_trait]
pub trait ReadHandle: Send {
    async fn read_to_end(&mut self) -> Result<Bytes, StoreError>;

    async fn release(&mut self) -> Result<(), StoreError>;
}
