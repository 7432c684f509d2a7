use core::cell::RefCell;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Config, DriftEngine, DriftState, Error, IdGenerator, Result, TimeSource};

/// A non-concurrent drift generator suitable for single-threaded
/// environments.
///
/// This generator is lightweight and fast, but **not thread-safe**: it is
/// `!Sync`, so the compiler refuses to share it between threads.
///
/// ## Features
/// - ❌ Not thread-safe
/// - ✅ Drift and turn-back compensation
///
/// ## Recommended When
/// - You're in a single-threaded environment (no shared access)
/// - You want the fastest drift generator
///
/// ## See Also
/// - [`LockDriftGenerator`]
/// - [`ClassicGenerator`]
///
/// [`LockDriftGenerator`]: crate::LockDriftGenerator
/// [`ClassicGenerator`]: crate::ClassicGenerator
pub struct BasicDriftGenerator<T> {
    engine: RefCell<DriftEngine<T>>,
}

impl<T> BasicDriftGenerator<T>
where
    T: TimeSource<u64>,
{
    /// Creates a new [`BasicDriftGenerator`].
    ///
    /// # Example
    /// ```
    /// use driftid::{BasicDriftGenerator, Options, SystemClock};
    ///
    /// let config = Options::default().with_worker_id(2).validate().unwrap();
    /// let generator = BasicDriftGenerator::new(config, SystemClock);
    ///
    /// let id = generator.next_id();
    /// assert_eq!(config.decode(id).worker_id, 2);
    /// ```
    pub fn new(config: Config, clock: T) -> Self {
        Self {
            engine: RefCell::new(DriftEngine::new(config, clock)),
        }
    }

    /// Generates a new ID.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from inside the generator's own
    /// [`TimeSource`]. Use [`Self::try_next_id`] to get an error instead.
    pub fn next_id(&self) -> u64 {
        self.engine.borrow_mut().next_id()
    }

    /// Generates a new ID with fallible error handling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentAccess`] if the generator is re-entered
    /// while a call is in flight.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<u64> {
        let mut engine = self
            .engine
            .try_borrow_mut()
            .map_err(|_| Error::ConcurrentAccess)?;
        Ok(engine.next_id())
    }

    pub fn config(&self) -> Config {
        *self.engine.borrow().config()
    }

    pub fn state(&self) -> DriftState {
        self.engine.borrow().state()
    }

    pub fn into_inner(self) -> DriftEngine<T> {
        self.engine.into_inner()
    }
}

impl<T> IdGenerator for BasicDriftGenerator<T>
where
    T: TimeSource<u64>,
{
    fn try_next_id(&self) -> Result<u64> {
        self.try_next_id()
    }
}
