use core::fmt;

/// The three components packed into an ID.
///
/// Returned by [`crate::Layout::decode`] and [`crate::Config::decode`]. Mostly
/// useful for debugging and tests; the IDs themselves are plain `u64`s.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdParts {
    /// Milliseconds since the configured base time. Drifted or turned-back IDs
    /// carry synthetic ticks that differ from the wall clock.
    pub time_tick: u64,
    /// The worker code of the issuing process.
    pub worker_id: u64,
    /// Sequence within the tick, or the turn-back index (1-4) for IDs issued
    /// while the clock was behind.
    pub sequence: u64,
}

impl IdParts {
    pub const fn new(time_tick: u64, worker_id: u64, sequence: u64) -> Self {
        Self {
            time_tick,
            worker_id,
            sequence,
        }
    }
}

impl fmt::Display for IdParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick={} worker={} seq={}",
            self.time_tick, self.worker_id, self.sequence
        )
    }
}
