use crate::TimeSource;
use std::time::{SystemTime, UNIX_EPOCH};

/// The wall clock, read through [`SystemTime`] on every call.
///
/// Unlike [`crate::MonotonicClock`] this clock follows NTP corrections, VM
/// migrations and manual adjustments, so it **can move backward**. The drift
/// generators compensate for that; the classic generator reports it as
/// [`crate::Error::ClockRollback`].
///
/// A clock set before the Unix epoch reads as `0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub const fn new() -> Self {
        Self
    }
}

impl TimeSource<u64> for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}
