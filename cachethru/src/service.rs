//! Call cache service
//!
//! This module provides the decorator that sits in front of a remote
//! call: it resolves the call's policy, consults the store, awaits the
//! upstream only when needed, falls back to stale entries on failure,
//! and persists fresh results as a side effect. The service holds only
//! immutable collaborators; everything per-call lives on the stack of
//! `call`, so one instance serves concurrent calls.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{Codec, JsonCodec};
use crate::config::CacheConfig;
use crate::context::CallContext;
use crate::error::{CallError, CallResult, ConfigError};
use crate::key::{CacheKey, DefaultKeyGenerator, KeyGenerator};
use crate::method::{MethodConfig, MethodEntry, MethodTable};
use crate::policy::CachePolicy;
use crate::record::Record;
use crate::store::{Store, StoreFactory};
use crate::stream::{EntryReader, EntryWriter};
use crate::time;

/// Caching decorator for remote service calls
///
/// Built through [`CallCacheBuilder`]; the codec is a type parameter so
/// payload formats other than JSON can be plugged in without dynamic
/// dispatch.
pub struct CallCache<C: Codec = JsonCodec> {
    store: Arc<dyn Store>,
    codec: C,
    key_generator: Arc<dyn KeyGenerator>,
    override_policy: CachePolicy,
    methods: MethodTable,
}

impl CallCache {
    /// Start building a cache with the default JSON codec
    pub fn builder() -> CallCacheBuilder {
        CallCacheBuilder::new()
    }

    /// Build a cache directly from a loaded configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        CallCacheBuilder::from_config(config)?.build()
    }
}

impl<C: Codec> CallCache<C> {
    /// Run one decorated call.
    ///
    /// The upstream future is lazy and is awaited at most once, and only
    /// when no fresh cached value was served. On upstream failure the
    /// call falls back to a stored entry of any age when the policy
    /// allows, otherwise the original error comes back unchanged. Fresh
    /// network results are persisted best-effort when the policy allows;
    /// store and codec trouble on that path is logged and never fails
    /// the call.
    ///
    /// # Arguments
    ///
    /// * `method` - Call identity, matched against registered methods
    /// * `args` - Call arguments; together with `method` they address the
    ///   cache entry
    /// * `upstream` - The remote call, as an unpolled future
    ///
    /// # Returns
    ///
    /// The payload, or a `Config` error from call setup, or the original
    /// upstream error.
    pub async fn call<T, A, E, F>(&self, method: &str, args: &A, upstream: F) -> CallResult<T, E>
    where
        T: Serialize + DeserializeOwned + 'static,
        A: Serialize + ?Sized,
        F: Future<Output = Result<T, E>>,
    {
        let context =
            CallContext::resolve::<T, _>(method, args, &self.methods, self.override_policy)?;
        let key = self.key_generator.derive(&context);

        if context.can_read_fresh()
            && let Some(record) = self.restore_fresh::<T>(&context, &key).await
        {
            log::debug!("Cache hit for '{method}' ({key})");
            return Ok(record.into_payload());
        }

        let record = match upstream.await {
            Ok(payload) => Record::network(payload),
            Err(e) => {
                if !context.can_read_stale() {
                    return Err(CallError::Upstream(e));
                }
                match self.restore::<T>(&context, &key).await {
                    Some(record) => {
                        log::debug!("Serving stale cache entry for '{method}' ({key})");
                        record
                    }
                    None => return Err(CallError::Upstream(e)),
                }
            }
        };

        if record.is_from_network() && context.can_store() {
            self.persist(&context, &key, record.payload()).await;
        }

        Ok(record.into_payload())
    }

    /// Restore the entry only if it exists and is inside its freshness
    /// window. Any store failure classifies as a miss.
    async fn restore_fresh<T: DeserializeOwned>(
        &self,
        context: &CallContext,
        key: &CacheKey,
    ) -> Option<Record<T>> {
        let created_at = match self.store.created_at_millis(key).await {
            Ok(created_at) => created_at,
            Err(e) if e.is_not_found() => {
                log::debug!("Cache miss for '{}' ({key})", context.method());
                return None;
            }
            Err(e) => {
                log::warn!(
                    "Failed to read cache entry age for '{}' ({key}): {e}",
                    context.method()
                );
                return None;
            }
        };

        if context.is_expired(created_at, time::now_millis()) {
            log::debug!("Cache entry expired for '{}' ({key})", context.method());
            return None;
        }

        self.restore(context, key).await
    }

    /// Restore the entry regardless of age. Absence, store failures and
    /// decode failures all classify as a miss.
    async fn restore<T: DeserializeOwned>(
        &self,
        context: &CallContext,
        key: &CacheKey,
    ) -> Option<Record<T>> {
        let handle = match self.store.open_read(key).await {
            Ok(handle) => handle,
            Err(e) if e.is_not_found() => return None,
            Err(e) => {
                log::warn!(
                    "Failed to open cache entry for '{}' ({key}): {e}",
                    context.method()
                );
                return None;
            }
        };

        let mut reader = EntryReader::new(handle);
        let bytes = match reader.read_to_end().await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!(
                    "Failed to read cache entry for '{}' ({key}): {e}",
                    context.method()
                );
                reader.release().await;
                return None;
            }
        };
        reader.release().await;

        match self.codec.decode::<T>(context, &bytes) {
            Ok(payload) => Some(Record::cached(payload)),
            Err(e) => {
                log::warn!(
                    "Discarding undecodable cache entry for '{}' ({key}): {e}",
                    context.method()
                );
                None
            }
        }
    }

    /// Persist a fresh payload under the key, best effort.
    ///
    /// Encoding happens before the write handle opens, so an
    /// unserializable payload never disturbs an existing entry. A write
    /// that fails midway is abandoned uncommitted; the handle frees its
    /// slot on drop and the previous entry stays visible.
    async fn persist<T: Serialize>(&self, context: &CallContext, key: &CacheKey, payload: &T) {
        let bytes = match self.codec.encode(context, payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!(
                    "Failed to encode cache entry for '{}' ({key}): {e}",
                    context.method()
                );
                return;
            }
        };

        let handle = match self.store.open_write(key).await {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!(
                    "Failed to open cache write for '{}' ({key}): {e}",
                    context.method()
                );
                return;
            }
        };

        let mut writer = EntryWriter::new(handle);
        if let Err(e) = writer.write_all(&bytes).await {
            log::warn!(
                "Failed to stage cache entry for '{}' ({key}): {e}",
                context.method()
            );
            return;
        }

        writer.release().await;
        log::debug!("Stored cache entry for '{}' ({key})", context.method());
    }
}

/// Builder for [`CallCache`]
pub struct CallCacheBuilder<C: Codec = JsonCodec> {
    store: Option<Arc<dyn Store>>,
    codec: C,
    key_generator: Arc<dyn KeyGenerator>,
    override_policy: CachePolicy,
    methods: MethodTable,
}

impl CallCacheBuilder {
    /// Create a builder with the default JSON codec and key derivation
    pub fn new() -> Self {
        Self {
            store: None,
            codec: JsonCodec,
            key_generator: Arc::new(DefaultKeyGenerator),
            override_policy: CachePolicy::Unspecified,
            methods: MethodTable::new(),
        }
    }

    /// Create a builder from a loaded configuration
    ///
    /// Applies the override policy, registers every configured method
    /// without a payload pin, and creates the configured store backend.
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        let mut builder = Self::new().override_policy(config.override_policy);

        for (method, settings) in &config.methods {
            builder = builder.method_settings(method.clone(), settings.to_method_config());
        }

        Ok(builder.store(StoreFactory::create(&config.store)?))
    }
}

impl<C: Codec> CallCacheBuilder<C> {
    /// Set the store backend
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the payload codec
    pub fn codec<D: Codec>(self, codec: D) -> CallCacheBuilder<D> {
        CallCacheBuilder {
            store: self.store,
            codec,
            key_generator: self.key_generator,
            override_policy: self.override_policy,
            methods: self.methods,
        }
    }

    /// Replace the key derivation strategy
    pub fn key_generator(mut self, key_generator: Arc<dyn KeyGenerator>) -> Self {
        self.key_generator = key_generator;
        self
    }

    /// Set the global policy override; `Unspecified` defers to the
    /// per-method declarations
    pub fn override_policy(mut self, policy: CachePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    /// Register a method and pin the payload type its call sites must use
    pub fn method<T: 'static>(mut self, method: impl Into<String>, config: MethodConfig) -> Self {
        self.methods
            .insert(method, MethodEntry::with_payload::<T>(config));
        self
    }

    /// Register a method without pinning a payload type
    pub fn method_settings(mut self, method: impl Into<String>, config: MethodConfig) -> Self {
        self.methods.insert(method, MethodEntry::new(config));
        self
    }

    /// Finalize the cache
    pub fn build(self) -> Result<CallCache<C>, ConfigError> {
        let store = self.store.ok_or(ConfigError::MissingStore)?;

        Ok(CallCache {
            store,
            codec: self.codec,
            key_generator: self.key_generator,
            override_policy: self.override_policy,
            methods: self.methods,
        })
    }
}

impl Default for CallCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}
