//! Mock upstream call for testing
//!
//! The mock hands out lazy futures the way a real remote client would:
//! its call counter moves only when a future is actually polled, so
//! tests can assert that a cache hit never reached the upstream.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

/// Errors a mock upstream can be scripted to return
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockUpstreamError {
    #[error("Network is offline")]
    NetworkOffline,
    #[error("Upstream timed out")]
    Timeout,
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Clone)]
struct UpstreamBehavior<T> {
    result: Result<T, MockUpstreamError>,
    delay: Option<Duration>,
    call_count: usize,
}

/// Scriptable upstream with a poll-driven call counter
///
/// # Examples
///
/// ```rust
/// use cachethru_test_utils::MockUpstream;
///
/// # async fn example() {
/// let upstream = MockUpstream::succeeding("payload".to_string());
///
/// let unpolled = upstream.fetch();
/// assert_eq!(upstream.call_count(), 0);
/// drop(unpolled);
///
/// assert_eq!(upstream.fetch().await, Ok("payload".to_string()));
/// assert_eq!(upstream.call_count(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct MockUpstream<T> {
    behavior: Arc<Mutex<UpstreamBehavior<T>>>,
}

impl<T> Clone for MockUpstream<T> {
    fn clone(&self) -> Self {
        Self {
            behavior: Arc::clone(&self.behavior),
        }
    }
}

impl<T: Clone> MockUpstream<T> {
    /// Create a mock whose calls succeed with the given payload
    pub fn succeeding(payload: T) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(UpstreamBehavior {
                result: Ok(payload),
                delay: None,
                call_count: 0,
            })),
        }
    }

    /// Create a mock whose calls fail with the given error
    pub fn failing(error: MockUpstreamError) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(UpstreamBehavior {
                result: Err(error),
                delay: None,
                call_count: 0,
            })),
        }
    }

    /// Script subsequent calls to succeed with the given payload
    pub fn expect_success(&mut self, payload: T) {
        self.behavior.lock().unwrap().result = Ok(payload);
    }

    /// Script subsequent calls to fail with the given error
    pub fn expect_failure(&mut self, error: MockUpstreamError) {
        self.behavior.lock().unwrap().result = Err(error);
    }

    /// Add a delay before each call resolves
    pub fn set_delay(&mut self, delay: Duration) {
        self.behavior.lock().unwrap().delay = Some(delay);
    }

    /// Number of calls whose future was actually polled
    pub fn call_count(&self) -> usize {
        self.behavior.lock().unwrap().call_count
    }

    /// Perform one upstream call
    ///
    /// The returned future counts as a call only once polled.
    pub async fn fetch(&self) -> Result<T, MockUpstreamError> {
        let (result, delay) = {
            let mut behavior = self.behavior.lock().unwrap();
            behavior.call_count += 1;
            (behavior.result.clone(), behavior.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_script() {
        let upstream = MockUpstream::succeeding(7u32);

        assert_eq!(upstream.fetch().await, Ok(7));
        assert_eq!(upstream.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_script() {
        let mut upstream = MockUpstream::succeeding(7u32);
        upstream.expect_failure(MockUpstreamError::NetworkOffline);

        assert_eq!(
            upstream.fetch().await,
            Err(MockUpstreamError::NetworkOffline)
        );
    }

    #[tokio::test]
    async fn test_unpolled_future_is_not_counted() {
        let upstream = MockUpstream::succeeding("payload".to_string());

        let unpolled = upstream.fetch();
        assert_eq!(upstream.call_count(), 0);
        drop(unpolled);
        assert_eq!(upstream.call_count(), 0);

        upstream.fetch().await.unwrap();
        assert_eq!(upstream.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rescripting_applies_to_later_calls() {
        let mut upstream = MockUpstream::succeeding(1u32);

        assert_eq!(upstream.fetch().await, Ok(1));
        upstream.expect_success(2);
        assert_eq!(upstream.fetch().await, Ok(2));
        assert_eq!(upstream.call_count(), 2);
    }
}
