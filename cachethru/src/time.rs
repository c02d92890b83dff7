//! Helper functions for time conversion
//!
//! Cache entry timestamps are stored as milliseconds since the Unix
//! epoch so they survive serialization across store backends.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Convert SystemTime to milliseconds since Unix epoch
pub fn system_time_to_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Convert milliseconds since Unix epoch to SystemTime
pub fn millis_to_system_time(millis: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(millis as u64)
}

/// Get current time as milliseconds since Unix epoch
pub fn now_millis() -> i64 {
    system_time_to_millis(SystemTime::now())
}
