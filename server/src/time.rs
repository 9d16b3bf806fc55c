//! Time source abstraction for deterministic token-expiry testing.
//!
//! This module provides a `TimeSource` trait that abstracts over time
//! operations, allowing the system to use real system time in production
//! and simulated time in tests. Token lifetimes (access-token minutes,
//! refresh-token days) are always computed against an injected source,
//! never against an ambient clock.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

/// Abstraction over time operations.
///
/// This trait allows swapping between real system time and simulated time
/// for deterministic testing.
pub trait TimeSource: Send + Sync {
    /// Get the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time source using the system clock.
///
/// This is the default implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Simulated time source with a manually advanced clock.
///
/// Starts at a fixed instant and only moves when `advance` is called,
/// so expiry checks are fully deterministic.
#[derive(Debug)]
pub struct ManualTimeSource {
    now: RwLock<DateTime<Utc>>,
}

impl ManualTimeSource {
    /// Create a manual time source pinned to the given instant.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Move the clock forward by the given duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self
            .now
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self
            .now
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_time_source() {
        let source = SystemTimeSource;
        let t1 = source.now();
        let t2 = source.now();

        // Time should be reasonable (after 2020)
        assert!(t1.timestamp() > 1_577_836_800); // 2020-01-01 00:00:00 UTC
        // Time should not go backwards
        assert!(t2 >= t1);
    }

    #[test]
    fn test_manual_time_source_is_pinned() {
        let start = Utc::now();
        let source = ManualTimeSource::new(start);

        assert_eq!(source.now(), start);
        assert_eq!(source.now(), start);
    }

    #[test]
    fn test_manual_time_source_advance() {
        let start = Utc::now();
        let source = ManualTimeSource::new(start);

        source.advance(Duration::minutes(30));
        assert_eq!(source.now(), start + Duration::minutes(30));

        source.advance(Duration::days(2));
        assert_eq!(source.now(), start + Duration::minutes(30) + Duration::days(2));
    }
}
