//! File-based store implementation
//!
//! This module provides a directory-backed store that persists one file
//! per entry. An entry file starts with an 8-byte big-endian creation
//! timestamp in epoch millis, followed by the payload bytes. Commits
//! write to a temporary file and rename it into place, so readers only
//! ever see complete entries.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::error::StoreError;
use crate::key::CacheKey;
use crate::store::traits::{ReadHandle, Store, WriteHandle};

const HEADER_LEN: usize = 8;

#[derive(Debug, Default)]
struct FsState {
    writers: HashSet<CacheKey>,
}

fn lock_state(state: &Mutex<FsState>) -> MutexGuard<'_, FsState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Hex-encode the key so any key string maps onto a safe filename
fn file_stem(key: &CacheKey) -> String {
    let mut stem = String::with_capacity(key.as_str().len() * 2);
    for byte in key.as_str().bytes() {
        let _ = write!(stem, "{byte:02x}");
    }
    stem
}

/// Directory-backed store, one file per entry
///
/// Writer exclusivity is tracked per instance; separate `FsStore` values
/// over the same directory do not see each other's in-flight writers.
pub struct FsStore {
    dir: PathBuf,
    state: Arc<Mutex<FsState>>,
}

impl FsStore {
    /// Create a store rooted at the given directory, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            state: Arc::new(Mutex::new(FsState::default())),
        })
    }

    /// Create a store under the platform cache directory
    pub fn in_default_dir() -> Result<Self, StoreError> {
        let dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cachethru");
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.bin", file_stem(key)))
    }

    fn staging_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.tmp", file_stem(key)))
    }
}

#[async_trait]
impl Store for FsStore {
    async fn open_write(&self, key: &CacheKey) -> Result<Box<dyn WriteHandle>, StoreError> {
        {
            let mut state = lock_state(&self.state);
            if !state.writers.insert(key.clone()) {
                return Err(StoreError::writer_busy(key.as_str()));
            }
        }

        Ok(Box::new(FsWriteHandle {
            key: key.clone(),
            path: self.entry_path(key),
            staging_path: self.staging_path(key),
            state: Arc::clone(&self.state),
            buf: BytesMut::new(),
            committed: false,
        }))
    }

    async fn open_read(&self, key: &CacheKey) -> Result<Box<dyn ReadHandle>, StoreError> {
        let data = match fs::read(self.entry_path(key)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(key.as_str()));
            }
            Err(e) => return Err(e.into()),
        };

        if data.len() < HEADER_LEN {
            return Err(StoreError::backend(format!(
                "Truncated entry for key '{key}'"
            )));
        }

        let mut payload = Bytes::from(data);
        payload.advance(HEADER_LEN);

        Ok(Box::new(FsReadHandle {
            payload,
            released: false,
        }))
    }

    async fn created_at_millis(&self, key: &CacheKey) -> Result<i64, StoreError> {
        let mut file = match fs::File::open(self.entry_path(key)).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(key.as_str()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut header = [0u8; HEADER_LEN];
        file.read_exact(&mut header).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StoreError::backend(format!("Truncated entry for key '{key}'"))
            } else {
                e.into()
            }
        })?;

        Ok(i64::from_be_bytes(header))
    }
}

struct FsWriteHandle {
    key: CacheKey,
    path: PathBuf,
    staging_path: PathBuf,
    state: Arc<Mutex<FsState>>,
    buf: BytesMut,
    committed: bool,
}

#[async_trait]
impl WriteHandle for FsWriteHandle {
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

        let mut data = BytesMut::with_capacity(HEADER_LEN + self.buf.len());
        data.put_i64(created_at_millis);
        data.extend_from_slice(&self.buf);

        fs::write(&self.staging_path, &data).await?;
        fs::rename(&self.staging_path, &self.path).await?;

        self.committed = true;
        lock_state(&self.state).writers.remove(&self.key);

        Ok(())
    }
}

impl Drop for FsWriteHandle {
    fn drop(&mut self) {
        if !self.committed {
            // Abandoned commit attempts may leave a staging file behind
            let _ = std::fs::remove_file(&self.staging_path);
            lock_state(&self.state).writers.remove(&self.key);
        }
    }
}

struct FsReadHandle {
    payload: Bytes,
    released: bool,
}

#[async_trait]
impl ReadHandle for FsReadHandle {
    async fn read_to_end(&mut self) -> Result<Bytes, StoreError> {
        if self.released {
            return Err(StoreError::Released);
        }

        Ok(self.payload.clone())
    }

    async fn release(&mut self) -> Result<(), StoreError> {
        self.released = true;
        Ok(())
    }
}
