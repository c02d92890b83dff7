//! Test utilities for cachethru
//!
//! This crate provides mock collaborators for testing code that sits
//! around a call cache: a scriptable counting upstream and a
//! fault-injecting store wrapper.

pub mod mocks;

// Re-export commonly used types
pub use mocks::{FailurePlan, FlakyStore, MockUpstream, MockUpstreamError};

/// Initialize logging for tests
///
/// Safe to call from every test; only the first call installs the
/// logger.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
