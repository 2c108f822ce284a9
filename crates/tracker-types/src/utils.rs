//! Utility functions shared across tracker crates.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}
