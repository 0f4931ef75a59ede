//! Time utilities for Voyage pricing.

use chrono::{DateTime, Duration, Utc};

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Check if a timestamp has been reached.
pub fn is_expired(expiry: Timestamp) -> bool {
    now() >= expiry
}

/// Whole seconds remaining until `expiry`, clamped at zero.
pub fn seconds_until(expiry: Timestamp) -> i64 {
    let remaining = expiry - now();
    if remaining < Duration::zero() {
        0
    } else {
        remaining.num_seconds()
    }
}
