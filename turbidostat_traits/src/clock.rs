use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock abstraction for the control loop.
///
/// - epoch(): time since the Unix epoch (drives log timestamps and the
///   growth-test schedule, which is anchored to wall-clock time)
/// - sleep(): sleeps for the provided duration (implementations may simulate)
pub trait Clock {
    fn epoch(&self) -> Duration;
    fn sleep(&self, d: Duration);

    /// Whole seconds since the Unix epoch.
    fn epoch_secs(&self) -> i64 {
        i64::try_from(self.epoch().as_secs()).unwrap_or(i64::MAX)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn epoch(&self) -> Duration {
        (**self).epoch()
    }

    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

/// Real clock backed by `SystemTime` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn epoch(&self) -> Duration {
        // A clock set before 1970 reads as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Deterministic clock whose time only moves when advanced or slept on.
///
/// epoch() = start + offset
/// sleep(d) advances internal time by d without actually sleeping.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Duration,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(Duration::ZERO)
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at `start` past the Unix epoch.
    pub fn at(start: Duration) -> Self {
        Self {
            start,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Total time slept or advanced since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn epoch(&self) -> Duration {
        self.start.saturating_add(self.elapsed())
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::at(Duration::from_secs(100));
        clock.sleep(Duration::from_millis(1500));
        assert_eq!(clock.epoch(), Duration::from_millis(101_500));
        assert_eq!(clock.epoch_secs(), 101);
        assert_eq!(clock.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    fn clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(Duration::from_secs(7));
        assert_eq!(b.epoch_secs(), 7);
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock::new().epoch_secs() > 1_577_836_800);
    }
}
