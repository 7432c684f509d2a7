use std::sync::Arc;

/// Default base time: Wednesday, February 19, 2020 18:20:02 UTC, in
/// milliseconds since the Unix epoch.
///
/// Used whenever [`crate::Options::base_time`] is left at `0`.
pub const DEFAULT_BASE_TIME: u64 = 1_582_136_402_000;

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the real system clock, a monotonic
/// clock, or a mocked time source in tests.
///
/// The unit is **milliseconds since the Unix epoch**. Generators subtract the
/// configured base time themselves to obtain a time-tick.
///
/// # Example
///
/// ```
/// use driftid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_700_000_000_000
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1_700_000_000_000);
/// ```
pub trait TimeSource<T> {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> T;
}

impl<T, S> TimeSource<T> for &S
where
    S: TimeSource<T> + ?Sized,
{
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}

impl<T, S> TimeSource<T> for Arc<S>
where
    S: TimeSource<T> + ?Sized,
{
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}
