/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `driftid` can emit.
///
/// Only [`Error::InvalidConfig`] is raised during construction. The remaining
/// variants surface from `next_id` and depend on which strategy is active: the
/// drift engine never reports a clock rollback, it compensates for it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A configuration value is out of range or inconsistent with another.
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending option.
        field: &'static str,
        /// Human readable explanation, including the accepted range.
        reason: String,
    },

    /// The classic strategy observed the clock moving behind the last issued
    /// time-tick.
    ///
    /// Retrying immediately will most likely fail again; the clock has to
    /// catch up to `last_tick` first.
    #[error(
        "clock moved backwards by {} ms (last tick {last_tick}, now {current_tick})",
        rollback_distance(.last_tick, .current_tick)
    )]
    ClockRollback {
        /// The last time-tick an ID was issued for.
        last_tick: u64,
        /// The time-tick the clock reported.
        current_tick: u64,
    },

    /// An unguarded drift generator (`lock = false`) was entered while
    /// another call was still in flight.
    ///
    /// Unguarded generators require the caller to serialize access. Rather
    /// than corrupting the sequence state, the second caller is rejected.
    #[error("concurrent access to an unguarded generator")]
    ConcurrentAccess,

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is never produced.
    #[error("generator lock poisoned")]
    LockPoisoned,

    /// An external accelerated implementation failed.
    #[error("accelerator error: {0}")]
    Accelerator(String),
}

#[cfg(not(feature = "parking-lot"))]
impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}

fn rollback_distance(last_tick: &u64, current_tick: &u64) -> u64 {
    last_tick.saturating_sub(*current_tick)
}

impl Error {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
