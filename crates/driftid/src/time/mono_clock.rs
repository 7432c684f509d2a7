use crate::TimeSource;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A time source that never moves backward.
///
/// The wall clock is sampled once at construction; afterwards time advances
/// only by the elapsed [`Instant`] duration. External clock adjustments (NTP
/// steps, daylight savings, manual changes) made after construction are
/// ignored, so the reported time may slowly diverge from the wall clock over
/// a long process lifetime.
///
/// Pairing this clock with the classic generator avoids
/// [`crate::Error::ClockRollback`] entirely.
///
/// # Example
///
/// ```
/// use driftid::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock::new();
/// let a: u64 = clock.current_millis();
/// std::thread::sleep(std::time::Duration::from_millis(2));
/// let b: u64 = clock.current_millis();
/// assert!(b >= a);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    start: Instant,
    offset: u64, // wall-clock millis at `start`
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock at the current wall-clock time.
    ///
    /// A wall clock set before the Unix epoch anchors at `0`.
    pub fn new() -> Self {
        let start = Instant::now();
        let offset = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        Self { start, offset }
    }

    /// Anchors a new clock at an explicit Unix millisecond value.
    pub fn with_offset(offset: u64) -> Self {
        Self {
            start: Instant::now(),
            offset,
        }
    }
}

impl TimeSource<u64> for MonotonicClock {
    /// Returns the anchor time plus the monotonic time elapsed since
    /// construction.
    fn current_millis(&self) -> u64 {
        self.offset + self.start.elapsed().as_millis() as u64
    }
}
