//! Time source abstraction.
//!
//! Token issuance and expiry checks read the current time through a
//! `TimeSource`, so production uses the system clock while tests advance a
//! manual clock explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over wall-clock reads.
pub trait TimeSource: Send + Sync {
    /// Get the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Get the current time in whole seconds since Unix epoch.
    fn now_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}

/// Real time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        // A clock set before 1970 reads as the epoch rather than panicking.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// A time source that only moves when told to.
///
/// Shareable across threads, so a test can hold one `Arc` and advance it
/// while the token service holds another.
///
/// # Example
///
/// ```
/// use storefront::time::{ManualTimeSource, TimeSource};
///
/// let time = ManualTimeSource::new(1000);
/// time.advance(500);
/// assert_eq!(time.now_ms(), 1500);
/// ```
#[derive(Debug)]
pub struct ManualTimeSource {
    current_time_ms: AtomicU64,
}

impl ManualTimeSource {
    /// Create a manual time source at the given time.
    #[must_use]
    pub const fn new(initial_time_ms: u64) -> Self {
        Self {
            current_time_ms: AtomicU64::new(initial_time_ms),
        }
    }

    /// Create a manual time source starting around November 2023.
    #[must_use]
    pub const fn default_start() -> Self {
        Self::new(1_700_000_000_000)
    }

    /// Advance time by the given number of milliseconds, saturating at `u64::MAX`.
    pub fn advance(&self, ms: u64) {
        let _ = self
            .current_time_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(ms))
            });
    }

    /// Set the current time. May move time backwards.
    pub fn set(&self, time_ms: u64) {
        self.current_time_ms.store(time_ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.current_time_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_time_source() {
        let source = SystemTimeSource;
        let t1 = source.now_ms();
        let t2 = source.now_ms();

        // After 2020-01-01 00:00:00 UTC
        assert!(t1 > 1_577_836_800_000);
        assert!(t2 >= t1);
    }

    #[test]
    fn test_manual_time_source_advance_and_set() {
        let time = ManualTimeSource::new(1_000);
        assert_eq!(time.now_ms(), 1_000);
        assert_eq!(time.now_secs(), 1);

        time.advance(2_500);
        assert_eq!(time.now_ms(), 3_500);
        assert_eq!(time.now_secs(), 3);

        time.set(500);
        assert_eq!(time.now_ms(), 500);
    }

    #[test]
    fn test_manual_time_source_saturates() {
        let time = ManualTimeSource::new(u64::MAX - 1);
        time.advance(10);
        assert_eq!(time.now_ms(), u64::MAX);
    }
}
