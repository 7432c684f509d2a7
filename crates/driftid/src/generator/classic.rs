use core::cmp;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Config, Error, IdGenerator, Result, TimeSource};

/// A lock-free, fixed-width Snowflake generator without drift or turn-back.
///
/// The last issued ID is kept in an [`AtomicU64`] and advanced with a single
/// compare-and-swap per call. When a tick's sequence runs out the call spins
/// until the clock moves on. When the clock reads behind the last issued tick
/// the call fails with [`Error::ClockRollback`].
///
/// ## Features
/// - ✅ Thread-safe
/// - ❌ Clock rollback tolerance
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Lower latency matters more than tolerating backward clock steps, e.g.
///   together with [`crate::MonotonicClock`]
///
/// ## See Also
/// - [`BasicDriftGenerator`]
/// - [`LockDriftGenerator`]
///
/// [`BasicDriftGenerator`]: crate::BasicDriftGenerator
/// [`LockDriftGenerator`]: crate::LockDriftGenerator
pub struct ClassicGenerator<T> {
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    config: Config,
    clock: T,
}

impl<T> ClassicGenerator<T>
where
    T: TimeSource<u64>,
{
    /// Creates a new [`ClassicGenerator`].
    ///
    /// Tick zero starts out exhausted, so the first ID always carries a tick
    /// read from the clock.
    ///
    /// # Example
    /// ```
    /// use driftid::{ClassicGenerator, Method, MonotonicClock, Options};
    ///
    /// let config = Options::default().with_method(Method::Classic).validate().unwrap();
    /// let generator = ClassicGenerator::new(config, MonotonicClock::new());
    ///
    /// let a = generator.try_next_id().unwrap();
    /// let b = generator.try_next_id().unwrap();
    /// assert!(b > a);
    /// ```
    pub fn new(config: Config, clock: T) -> Self {
        let initial = AtomicU64::new(config.encode(0, config.max_seq_number()));
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(initial),
            #[cfg(not(feature = "cache-padded"))]
            state: initial,
            config,
            clock,
        }
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Generates a new ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRollback`] if the clock is behind the last issued
    /// tick. Retrying succeeds only once the clock has caught up.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<u64> {
        loop {
            // Load before reading the clock: a tick stored by another thread
            // was read from the clock earlier and cannot be ahead of `now`
            // unless the clock really moved back.
            let current_raw = self.state.load(Ordering::Acquire);
            let current = self.config.decode(current_raw);
            let now = self.config.time_tick(self.clock.current_millis());

            let next_raw = match now.cmp(&current.time_tick) {
                cmp::Ordering::Equal => {
                    if current.sequence < self.config.max_seq_number() {
                        self.config.encode(now, current.sequence + 1)
                    } else {
                        self.wait_past(now);
                        continue;
                    }
                }
                cmp::Ordering::Greater => self.config.encode(now, self.config.min_seq_number()),
                cmp::Ordering::Less => return Err(Self::cold_clock_behind(current.time_tick, now)),
            };

            if self
                .state
                .compare_exchange(current_raw, next_raw, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break Ok(next_raw);
            }
            // CAS failed - another thread won the race. Retry immediately.
            core::hint::spin_loop();
        }
    }

    /// Spins until the clock reads past `tick`.
    fn wait_past(&self, tick: u64) {
        while self.config.time_tick(self.clock.current_millis()) <= tick {
            core::hint::spin_loop();
            std::thread::yield_now();
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(last_tick: u64, current_tick: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(last_tick, current_tick, "clock moved backwards");
        Error::ClockRollback {
            last_tick,
            current_tick,
        }
    }
}

impl<T> IdGenerator for ClassicGenerator<T>
where
    T: TimeSource<u64>,
{
    fn try_next_id(&self) -> Result<u64> {
        self.try_next_id()
    }
}
