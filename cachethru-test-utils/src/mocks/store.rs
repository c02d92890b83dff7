//! Fault-injecting store wrapper for testing
//!
//! Wraps any real store and fails selected operations on demand, so
//! tests can verify that callers survive store trouble. Handles capture
//! the plan when they open; reconfiguring the plan affects later opens
//! only.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use cachethru::{CacheKey, ReadHandle, Store, StoreError, WriteHandle};

/// Which operations should fail
#[derive(Debug, Clone, Copy, Default)]
pub struct FailurePlan {
    pub fail_open_read: bool,
    pub fail_open_write: bool,
    pub fail_created_at: bool,
    pub fail_commit: bool,
    pub fail_read: bool,
    pub fail_release: bool,
}

fn injected(op: &str) -> StoreError {
    StoreError::backend(format!("Injected {op} failure"))
}

/// Store wrapper that fails the operations its plan names
pub struct FlakyStore {
    inner: Arc<dyn Store>,
    plan: Arc<Mutex<FailurePlan>>,
}

impl FlakyStore {
    /// Wrap a store; the initial plan fails nothing
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            plan: Arc::new(Mutex::new(FailurePlan::default())),
        }
    }

    /// Replace the failure plan for subsequent operations
    pub fn set_plan(&self, plan: FailurePlan) {
        *self.plan.lock().unwrap() = plan;
    }

    pub fn plan(&self) -> FailurePlan {
        *self.plan.lock().unwrap()
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn open_write(&self, key: &CacheKey) -> Result<Box<dyn WriteHandle>, StoreError> {
        let plan = self.plan();
        if plan.fail_open_write {
            return Err(injected("open_write"));
        }

        let inner = self.inner.open_write(key).await?;
        Ok(Box::new(FlakyWriteHandle {
            inner,
            fail_commit: plan.fail_commit,
        }))
    }

    async fn open_read(&self, key: &CacheKey) -> Result<Box<dyn ReadHandle>, StoreError> {
        let plan = self.plan();
        if plan.fail_open_read {
            return Err(injected("open_read"));
        }

        let inner = self.inner.open_read(key).await?;
        Ok(Box::new(FlakyReadHandle {
            inner,
            fail_read: plan.fail_read,
            fail_release: plan.fail_release,
        }))
    }

    async fn created_at_millis(&self, key: &CacheKey) -> Result<i64, StoreError> {
        if self.plan().fail_created_at {
            return Err(injected("created_at_millis"));
        }

        self.inner.created_at_millis(key).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.close().await
    }
}

struct FlakyWriteHandle {
    inner: Box<dyn WriteHandle>,
    fail_commit: bool,
}

#[async_trait]
impl WriteHandle for FlakyWriteHandle {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.inner.write_all(bytes).await
    }

    async fn commit(&mut self, created_at_millis: i64) -> Result<(), StoreError> {
        if self.fail_commit {
            // The inner handle stays uncommitted and publishes nothing
            return Err(injected("commit"));
        }

        self.inner.commit(created_at_millis).await
    }
}

struct FlakyReadHandle {
    inner: Box<dyn ReadHandle>,
    fail_read: bool,
    fail_release: bool,
}

#[async_trait]
impl ReadHandle for FlakyReadHandle {
    async fn read_to_end(&mut self) -> Result<Bytes, StoreError> {
        if self.fail_read {
            return Err(injected("read_to_end"));
        }

        self.inner.read_to_end().await
    }

    async fn release(&mut self) -> Result<(), StoreError> {
        // Free the inner lease even when scripted to report failure
        let result = self.inner.release().await;
        if self.fail_release {
            return Err(injected("release"));
        }

        result
    }
}
