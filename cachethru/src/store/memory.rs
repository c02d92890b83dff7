//! Memory-based store implementation
//!
//! This module provides an in-process store used as the default test
//! backend. Entries live in a map guarded by an async lock; commit and
//! lease counters are exposed so tests can assert on store traffic.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::key::CacheKey;
use crate::store::traits::{ReadHandle, Store, WriteHandle};

/// One committed entry
#[derive(Debug, Clone)]
struct MemoryEntry {
    bytes: Bytes,
    created_at_millis: i64,
}

/// Writer slots and counters shared with the handles
///
/// Guarded by a sync mutex so handle `Drop` impls can reach it.
#[derive(Debug, Default)]
struct SharedState {
    writers: HashSet<CacheKey>,
    commit_count: u64,
    open_leases: usize,
}

fn lock_state(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Observable store traffic, for tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStoreStats {
    pub entry_count: usize,
    pub commit_count: u64,
    pub open_leases: usize,
}

/// In-memory store with snapshot reads and per-key writer exclusivity
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<CacheKey, MemoryEntry>>>,
    state: Arc<Mutex<SharedState>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            state: Arc::new(Mutex::new(SharedState::default())),
        }
    }

    /// Snapshot the current counters
    pub async fn stats(&self) -> MemoryStoreStats {
        let entry_count = self.entries.read().await.len();
        let state = lock_state(&self.state);

        MemoryStoreStats {
            entry_count,
            commit_count: state.commit_count,
            open_leases: state.open_leases,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn open_write(&self, key: &CacheKey) -> Result<Box<dyn WriteHandle>, StoreError> {
        {
            let mut state = lock_state(&self.state);
            if !state.writers.insert(key.clone()) {
                return Err(StoreError::writer_busy(key.as_str()));
            }
        }

        Ok(Box::new(MemoryWriteHandle {
            key: key.clone(),
            entries: Arc::clone(&self.entries),
            state: Arc::clone(&self.state),
            buf: BytesMut::new(),
            committed: false,
        }))
    }

    async fn open_read(&self, key: &CacheKey) -> Result<Box<dyn ReadHandle>, StoreError> {
        let snapshot = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .map(|entry| entry.bytes.clone())
                .ok_or_else(|| StoreError::not_found(key.as_str()))?
        };

        lock_state(&self.state).open_leases += 1;

        Ok(Box::new(MemoryReadHandle {
            snapshot,
            state: Arc::clone(&self.state),
            released: false,
        }))
    }

    async fn created_at_millis(&self, key: &CacheKey) -> Result<i64, StoreError> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .map(|entry| entry.created_at_millis)
            .ok_or_else(|| StoreError::not_found(key.as_str()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryWriteHandle {
    key: CacheKey,
    entries: Arc<RwLock<HashMap<CacheKey, MemoryEntry>>>,
    state: Arc<Mutex<SharedState>>,
    buf: BytesMut,
    committed: bool,
}

#[async_trait]
impl WriteHandle for MemoryWriteHandle {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        if self.committed {
            return Err(StoreError::Released);
        }

        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    async fn commit(&mut self, created_at_millis: i64) -> Result<(), StoreError> {
        if self.committed {
            return Err(StoreError::Released);
        }

        let entry = MemoryEntry {
            bytes: self.buf.split().freeze(),
            created_at_millis,
        };
        self.entries.write().await.insert(self.key.clone(), entry);

        self.committed = true;
        let mut state = lock_state(&self.state);
        state.writers.remove(&self.key);
        state.commit_count += 1;

        Ok(())
    }
}

impl Drop for MemoryWriteHandle {
    fn drop(&mut self) {
        // An uncommitted handle frees its writer slot; its bytes vanish
        if !self.committed {
            lock_state(&self.state).writers.remove(&self.key);
        }
    }
}

struct MemoryReadHandle {
    snapshot: Bytes,
    state: Arc<Mutex<SharedState>>,
    released: bool,
}

#[async_trait]
impl ReadHandle for MemoryReadHandle {
    async fn read_to_end(&mut self) -> Result<Bytes, StoreError> {
        if self.released {
            return Err(StoreError::Released);
        }

        Ok(self.snapshot.clone())
    }

    async fn release(&mut self) -> Result<(), StoreError> {
        if !self.released {
            self.released = true;
            let mut state = lock_state(&self.state);
            state.open_leases = state.open_leases.saturating_sub(1);
        }

        Ok(())
    }
}

impl Drop for MemoryReadHandle {
    fn drop(&mut self) {
        if !self.released {
            let mut state = lock_state(&self.state);
            state.open_leases = state.open_leases.saturating_sub(1);
        }
    }
}
