//! Call result provenance

/// Where a payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Produced by the upstream call during this invocation
    Network,
    /// Read back from the cache store
    Cache,
}

/// A payload tagged with its provenance
///
/// Only `Network` records are eligible for persistence. Anything read
/// back from the store is tagged `Cache` and is never written again.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    payload: T,
    origin: Origin,
}

impl<T> Record<T> {
    /// Tag a payload as produced by the upstream call
    pub fn network(payload: T) -> Self {
        Self {
            payload,
            origin: Origin::Network,
        }
    }

    /// Tag a payload as read back from the store
    pub fn cached(payload: T) -> Self {
        Self {
            payload,
            origin: Origin::Cache,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_from_network(&self) -> bool {
        self.origin == Origin::Network
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}
