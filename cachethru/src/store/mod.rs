//! Cache store contract and reference backends
//!
//! The storage engine is an external collaborator consumed through a
//! narrow contract: an addressable byte store with record-level
//! atomicity. This module defines that contract and ships three
//! reference backends (filesystem, in-memory, no-op) plus a factory
//! selecting between them from configuration.

pub mod factory;
pub mod fs;
pub mod memory;
pub mod noop;
pub mod traits;

pub use factory::{StoreConfig, StoreFactory};
pub use fs::FsStore;
pub use memory::{MemoryStore, MemoryStoreStats};
pub use noop::NoopStore;
pub use traits::{ReadHandle, Store, WriteHandle};
