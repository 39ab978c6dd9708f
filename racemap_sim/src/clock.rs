//! Time source for simulated vehicles.
//!
//! Vehicle threads never call `std::time` directly, so the same loop runs
//! against the wall clock in production and a virtual clock in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Abstraction over time for vehicle update loops.
pub trait SimClock: Send + Sync + 'static {
    /// Monotonic time since the clock was created.
    fn now(&self) -> Duration;

    /// Wall-clock timestamp for fixes, in Unix milliseconds.
    fn unix_millis(&self) -> i64;

    /// Blocks the calling thread for `duration`.
    ///
    /// Virtual clocks advance instead of blocking.
    fn sleep(&self, duration: Duration);
}

/// Production clock backed by the OS.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn unix_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock whose time only moves when advanced.
///
/// `sleep` advances virtual time and yields, so vehicle loops spin as fast
/// as the scheduler allows.
#[derive(Debug)]
pub struct VirtualClock {
    virtual_time_ns: AtomicU64,
    epoch_ms: i64,
}

impl VirtualClock {
    /// 2024-01-01 00:00:00 UTC
    const DEFAULT_EPOCH_MS: i64 = 1_704_067_200_000;

    pub fn new() -> Self {
        Self {
            virtual_time_ns: AtomicU64::new(0),
            epoch_ms: Self::DEFAULT_EPOCH_MS,
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock for VirtualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.virtual_time_ns.load(Ordering::SeqCst))
    }

    fn unix_millis(&self) -> i64 {
        self.epoch_ms + self.now().as_millis() as i64
    }

    fn sleep(&self, duration: Duration) {
        self.advance_time(duration);
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_time() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        clock.sleep(Duration::from_millis(10));
        let t2 = clock.now();

        assert!(t2 - t1 >= Duration::from_millis(10));
        assert!(clock.unix_millis() > VirtualClock::DEFAULT_EPOCH_MS);
    }

    #[test]
    fn test_virtual_clock_advances_on_sleep() {
        let clock = VirtualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.sleep(Duration::from_millis(250));
        clock.advance_time(Duration::from_millis(750));

        assert_eq!(clock.now(), Duration::from_secs(1));
        assert_eq!(clock.unix_millis(), VirtualClock::DEFAULT_EPOCH_MS + 1000);
    }
}
