//! Mock implementations for testing

pub mod store;
pub mod upstream;

pub use store::{FailurePlan, FlakyStore};
pub use upstream::{MockUpstream, MockUpstreamError};
