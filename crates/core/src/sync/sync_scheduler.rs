//! Scheduler constants for client sync.

/// Periodic push cadence in seconds.
pub const AUTO_SYNC_INTERVAL_SECS: u64 = 5 * 60;

/// Upper bound on a single API request, in seconds. Timeouts count as transport failures.
pub const SYNC_REQUEST_TIMEOUT_SECS: u64 = 10;
