//! cachethru
//!
//! A transparent caching decorator for remote service calls. A
//! [`CallCache`] sits in front of any async call: per-method policies
//! decide whether to serve a stored value, call through, or fall back to
//! a stale value when the upstream fails, and fresh results are
//! persisted as a side effect. Storage and payload encoding are
//! pluggable behind narrow contracts; filesystem, in-memory, and no-op
//! store backends ship with the crate.

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod key;
pub mod method;
pub mod policy;
pub mod record;
pub mod service;
pub mod store;
pub mod stream;
pub mod time;

// Re-export main types
pub use codec::{Codec, JsonCodec};
pub use config::{CacheConfig, ConfigLoader, MethodSettings};
pub use context::CallContext;
pub use error::{CallError, CallResult, CodecError, ConfigError, StoreError};
pub use key::{CacheKey, DefaultKeyGenerator, KeyGenerator};
pub use method::{MethodConfig, MethodEntry, MethodTable, PayloadShape};
pub use policy::CachePolicy;
pub use record::{Origin, Record};
pub use service::{CallCache, CallCacheBuilder};
pub use store::{
    FsStore, MemoryStore, MemoryStoreStats, NoopStore, ReadHandle, Store, StoreConfig,
    StoreFactory, WriteHandle,
};
pub use stream::{EntryReader, EntryWriter};
