//! System utilities and monitoring
//!
//! This module contains metrics collection and other system-level
//! utilities for operating the gateway.

pub mod metrics;

use once_cell::sync::Lazy;
use std::time::Instant;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Record the process start time.
///
/// Called once during initialization so uptime counts from startup
/// rather than from the first health check.
pub fn mark_started() {
    Lazy::force(&STARTED_AT);
}

/// Seconds elapsed since the process started
pub fn uptime_secs() -> u64 {
    STARTED_AT.elapsed().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_is_monotonic() {
        mark_started();
        let first = uptime_secs();
        assert!(uptime_secs() >= first);
    }
}
