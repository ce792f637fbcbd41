//! Common time helpers for turbidostat_core.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use turbidostat_traits::Clock;

/// Valve hold time per unit of dilution command.
pub const PULSE_MS_PER_UNIT: u64 = 5;

/// Longest single sleep while waiting for the next cycle, so an interrupt is
/// noticed promptly.
pub const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// How long the auxiliary valve stays open for a command byte.
#[inline]
pub fn pulse_duration(command: u8) -> Duration {
    Duration::from_millis(u64::from(command) * PULSE_MS_PER_UNIT)
}

/// Sleep `total` in slices of at most `SLEEP_SLICE`, returning early once
/// `stop` is set. Returns `true` when the full duration elapsed.
pub fn sleep_unless_stopped(clock: &impl Clock, total: Duration, stop: &AtomicBool) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let slice = remaining.min(SLEEP_SLICE);
        clock.sleep(slice);
        remaining -= slice;
    }
    !stop.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbidostat_traits::ManualClock;

    #[test]
    fn pulse_scales_linearly() {
        assert_eq!(pulse_duration(0), Duration::ZERO);
        assert_eq!(pulse_duration(1), Duration::from_millis(5));
        assert_eq!(pulse_duration(255), Duration::from_millis(1275));
    }

    #[test]
    fn sleeps_full_duration() {
        let clock = ManualClock::new();
        let stop = AtomicBool::new(false);
        assert!(sleep_unless_stopped(&clock, Duration::from_secs(60), &stop));
        assert_eq!(clock.elapsed(), Duration::from_secs(60));
    }

    #[test]
    fn stop_flag_cuts_sleep_short() {
        let clock = ManualClock::new();
        let stop = AtomicBool::new(true);
        assert!(!sleep_unless_stopped(&clock, Duration::from_secs(60), &stop));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
