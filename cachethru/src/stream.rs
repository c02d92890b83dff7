//! Entry stream lifecycle guards
//!
//! Cached payloads travel through store handles whose cleanup must not
//! disturb the call that triggered them: the caller's result is already
//! determined by the time these run. Both guards here make release
//! idempotent and swallow release-time failures, logging them instead.

use bytes::Bytes;

use crate::error::StoreError;
use crate::store::{ReadHandle, WriteHandle};
use crate::time;

/// Commit-on-release guard for a staged cache write
///
/// Bytes staged through this writer become a visible cache entry on the
/// first `release()`, which stamps the current time as the entry's
/// creation time and commits. Later releases are no-ops; commit failures
/// are logged and swallowed.
pub struct EntryWriter {
    handle: Option<Box<dyn WriteHandle>>,
}

impl EntryWriter {
    pub fn new(handle: Box<dyn WriteHandle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Stage payload bytes; fails with `Released` once released
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        match self.handle.as_mut() {
            Some(handle) => handle.write_all(bytes).await,
            None => Err(StoreError::Released),
        }
    }

    /// Stamp the creation time and commit the staged entry
    pub async fn release(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        if let Err(e) = handle.commit(time::now_millis()).await {
            log::warn!("Failed to commit cache entry: {e}");
        }
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }
}

/// Release-on-close guard for a cache read lease
///
/// Frees the store's read lease exactly once no matter how the read
/// ended. Later releases are no-ops; release failures are logged and
/// swallowed.
pub struct EntryReader {
    handle: Option<Box<dyn ReadHandle>>,
}

impl EntryReader {
    pub fn new(handle: Box<dyn ReadHandle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Read the entry snapshot; fails with `Released` once released
    pub async fn read_to_end(&mut self) -> Result<Bytes, StoreError> {
        match self.handle.as_mut() {
            Some(handle) => handle.read_to_end().await,
            None => Err(StoreError::Released),
        }
    }

    /// Free the read lease
    pub async fn release(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        if let Err(e) = handle.release().await {
            log::warn!("Failed to release cache read lease: {e}");
        }
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct WriteScript {
        commits: AtomicUsize,
        last_stamp: AtomicI64,
        fail_commit: bool,
    }

    struct ScriptedWriteHandle(Arc<WriteScript>);

    #[async_trait]
    impl WriteHandle for ScriptedWriteHandle {
        async fn write_all(&mut self, _bytes: &[u8]) -> Result<(), StoreError> {
            Ok(())
        }

        async fn commit(&mut self, created_at_millis: i64) -> Result<(), StoreError> {
            self.0.commits.fetch_add(1, Ordering::SeqCst);
            self.0.last_stamp.store(created_at_millis, Ordering::SeqCst);
            if self.0.fail_commit {
                return Err(StoreError::backend("injected commit failure"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct ReadScript {
        releases: AtomicUsize,
        fail_release: bool,
    }

    struct ScriptedReadHandle(Arc<ReadScript>);

    #[async_trait]
    impl ReadHandle for ScriptedReadHandle {
        async fn read_to_end(&mut self) -> Result<Bytes, StoreError> {
            Ok(Bytes::from_static(b"snapshot"))
        }

        async fn release(&mut self) -> Result<(), StoreError> {
            self.0.releases.fetch_add(1, Ordering::SeqCst);
            if self.0.fail_release {
                return Err(StoreError::backend("injected release failure"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_writer_release_commits_once() {
        let script = Arc::new(WriteScript::default());
        let mut writer = EntryWriter::new(Box::new(ScriptedWriteHandle(Arc::clone(&script))));

        writer.write_all(b"payload").await.unwrap();
        assert!(!writer.is_released());

        writer.release().await;
        writer.release().await;
        writer.release().await;

        assert!(writer.is_released());
        assert_eq!(script.commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_writer_release_stamps_current_time() {
        let script = Arc::new(WriteScript::default());
        let mut writer = EntryWriter::new(Box::new(ScriptedWriteHandle(Arc::clone(&script))));

        let before = time::now_millis();
        writer.release().await;
        let after = time::now_millis();

        let stamped = script.last_stamp.load(Ordering::SeqCst);
        assert!(stamped >= before && stamped <= after);
    }

    #[tokio::test]
    async fn test_write_after_release_reports_released() {
        let script = Arc::new(WriteScript::default());
        let mut writer = EntryWriter::new(Box::new(ScriptedWriteHandle(script)));

        writer.release().await;

        assert!(matches!(
            writer.write_all(b"late").await,
            Err(StoreError::Released)
        ));
    }

    #[tokio::test]
    async fn test_writer_swallows_commit_failure() {
        let script = Arc::new(WriteScript {
            fail_commit: true,
            ..WriteScript::default()
        });
        let mut writer = EntryWriter::new(Box::new(ScriptedWriteHandle(Arc::clone(&script))));

        writer.write_all(b"payload").await.unwrap();
        writer.release().await;

        assert!(writer.is_released());
        assert_eq!(script.commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reader_release_is_idempotent() {
        let script = Arc::new(ReadScript::default());
        let mut reader = EntryReader::new(Box::new(ScriptedReadHandle(Arc::clone(&script))));

        assert_eq!(&reader.read_to_end().await.unwrap()[..], b"snapshot");

        reader.release().await;
        reader.release().await;

        assert!(reader.is_released());
        assert_eq!(script.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_after_release_reports_released() {
        let script = Arc::new(ReadScript::default());
        let mut reader = EntryReader::new(Box::new(ScriptedReadHandle(script)));

        reader.release().await;

        assert!(matches!(
            reader.read_to_end().await,
            Err(StoreError::Released)
        ));
    }

    #[tokio::test]
    async fn test_reader_swallows_release_failure() {
        let script = Arc::new(ReadScript {
            fail_release: true,
            ..ReadScript::default()
        });
        let mut reader = EntryReader::new(Box::new(ScriptedReadHandle(Arc::clone(&script))));

        reader.release().await;

        assert!(reader.is_released());
        assert_eq!(script.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_release_publishes_entry_to_store() {
        let store = MemoryStore::new();
        let key = crate::key::CacheKey::new("published");

        let before = time::now_millis();
        let mut writer = EntryWriter::new(store.open_write(&key).await.unwrap());
        writer.write_all(b"visible after release").await.unwrap();

        assert!(store.open_read(&key).await.is_err());
        writer.release().await;

        let created_at = store.created_at_millis(&key).await.unwrap();
        assert!(created_at >= before);

        let mut reader = EntryReader::new(store.open_read(&key).await.unwrap());
        assert_eq!(&reader.read_to_end().await.unwrap()[..], b"visible after release");
        reader.release().await;
    }
}
