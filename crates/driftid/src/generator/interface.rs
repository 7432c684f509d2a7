use crate::Result;

/// The contract every ID strategy fulfils.
///
/// Implemented by the drift generators, the classic generator, the strategy
/// selector [`crate::Generator`], and by any external accelerated
/// implementation plugged in through [`crate::Accelerator`].
pub trait IdGenerator {
    /// Generates the next ID.
    ///
    /// # Errors
    ///
    /// Depends on the strategy:
    /// - [`crate::Error::ClockRollback`] from the classic strategy when the
    ///   clock is behind the last issued tick.
    /// - [`crate::Error::ConcurrentAccess`] from an unguarded drift generator
    ///   entered by two callers at once.
    /// - [`crate::Error::LockPoisoned`] from a guarded drift generator whose
    ///   holder panicked.
    /// - [`crate::Error::Accelerator`] from an external implementation.
    fn try_next_id(&self) -> Result<u64>;

    /// Generates `count` IDs in call order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Self::try_next_id`].
    fn try_next_ids(&self, count: usize) -> Result<Vec<u64>> {
        (0..count).map(|_| self.try_next_id()).collect()
    }
}
