use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Config, DriftEngine, DriftState, Error, IdGenerator, Result, TimeSource,
    generator::{Mutex, MutexGuard},
};

/// A lock-based drift generator suitable for multi-threaded environments.
///
/// The whole drift transition reads and writes several fields, so every call
/// runs inside one critical section around a shared [`DriftEngine`]. Clones
/// share the same engine.
///
/// The configured `lock` flag chooses how that critical section is entered:
///
/// - `lock = true`: callers block on the mutex and are served one at a time.
/// - `lock = false`: the caller promises not to overlap calls. The mutex is
///   only probed; an overlapping call fails with
///   [`Error::ConcurrentAccess`] instead of corrupting the sequence state.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Drift and turn-back compensation
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - You need IDs to keep flowing through sequence exhaustion and clock
///   rollbacks
///
/// ## See Also
/// - [`BasicDriftGenerator`]
/// - [`ClassicGenerator`]
///
/// [`BasicDriftGenerator`]: crate::BasicDriftGenerator
/// [`ClassicGenerator`]: crate::ClassicGenerator
pub struct LockDriftGenerator<T> {
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<DriftEngine<T>>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<DriftEngine<T>>>,
    config: Config,
}

impl<T> Clone for LockDriftGenerator<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config,
        }
    }
}

impl<T> LockDriftGenerator<T>
where
    T: TimeSource<u64>,
{
    /// Creates a new [`LockDriftGenerator`].
    ///
    /// # Example
    /// ```
    /// use driftid::{LockDriftGenerator, Options, SystemClock};
    ///
    /// let config = Options::default().with_lock(true).validate().unwrap();
    /// let generator = LockDriftGenerator::new(config, SystemClock);
    ///
    /// let ids: Vec<u64> = std::thread::scope(|s| {
    ///     let handles: Vec<_> = (0..4)
    ///         .map(|_| s.spawn(|| generator.try_next_id().unwrap()))
    ///         .collect();
    ///     handles.into_iter().map(|h| h.join().unwrap()).collect()
    /// });
    /// assert_eq!(ids.len(), 4);
    /// ```
    pub fn new(config: Config, clock: T) -> Self {
        let engine = Mutex::new(DriftEngine::new(config, clock));
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(engine)),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(engine),
            config,
        }
    }

    /// Generates a new ID with fallible error handling.
    ///
    /// # Errors
    /// - [`Error::ConcurrentAccess`] if `lock = false` and another call is in
    ///   flight.
    /// - [`Error::LockPoisoned`] if a previous holder panicked (std mutex
    ///   only).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<u64> {
        let mut engine = self.acquire()?;
        Ok(engine.next_id())
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Snapshot of the engine state. Blocks while a call is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if a previous holder panicked (std
    /// mutex only).
    pub fn state(&self) -> Result<DriftState> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock().state())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?.state())
        }
    }

    fn acquire(&self) -> Result<MutexGuard<'_, DriftEngine<T>>> {
        if self.config.lock() {
            #[cfg(feature = "parking-lot")]
            {
                Ok(self.state.lock())
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                Ok(self.state.lock()?)
            }
        } else {
            #[cfg(feature = "parking-lot")]
            {
                self.state.try_lock().ok_or(Error::ConcurrentAccess)
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                use crate::generator::TryLockError;
                match self.state.try_lock() {
                    Ok(guard) => Ok(guard),
                    Err(TryLockError::WouldBlock) => Err(Error::ConcurrentAccess),
                    Err(TryLockError::Poisoned(_)) => Err(Error::LockPoisoned),
                }
            }
        }
    }
}

impl<T> IdGenerator for LockDriftGenerator<T>
where
    T: TimeSource<u64>,
{
    fn try_next_id(&self) -> Result<u64> {
        self.try_next_id()
    }
}
