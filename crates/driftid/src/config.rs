use core::time::Duration;

use crate::{
    DEFAULT_BASE_TIME, Error, IdParts, Layout, MAX_TURN_BACK_INDEX, Method, Result, SystemClock,
    TimeSource,
};

/// Width of the accepted `base_time` window, counted back from now.
const BASE_TIME_WINDOW_MS: u64 = 50 * 365 * 24 * 60 * 60 * 1000;

/// Upper bound on `worker_id_bit_length + seq_bit_length`.
const MAX_NON_TIME_BITS: u8 = 22;

const DEFAULT_BIT_LENGTH: u8 = 6;

/// Upper bound on `turn_back_delay_ms`. The delay runs while the engine is
/// held, so it stalls every other caller too.
const MAX_TURN_BACK_DELAY_MS: u64 = 1000;

/// Raw, unvalidated generator options.
///
/// Every field is public and may be set freely; nothing is checked until
/// [`Options::validate`] turns the options into an immutable [`Config`]. A
/// value of `0` for `worker_id_bit_length`, `seq_bit_length`,
/// `max_seq_number` or `base_time` selects the default for that field.
///
/// # Example
///
/// ```
/// use driftid::Options;
///
/// let config = Options::default()
///     .with_worker_id(3)
///     .with_seq_bit_length(10)
///     .validate()
///     .unwrap();
///
/// assert_eq!(config.worker_id(), 3);
/// assert_eq!(config.max_seq_number(), 1023);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Which ID strategy to run.
    pub method: Method,
    /// Epoch in milliseconds since the Unix epoch. IDs encode `now - base_time`.
    /// Must lie within the last 50 years and not in the future.
    pub base_time: u64,
    /// This process's worker code, `0..=2^worker_id_bit_length - 1`.
    pub worker_id: u32,
    /// Bits reserved for the worker code, `1..=21`.
    pub worker_id_bit_length: u8,
    /// Bits reserved for the sequence, `2..=21`. Together with
    /// `worker_id_bit_length` at most 22.
    pub seq_bit_length: u8,
    /// Highest sequence value per tick (inclusive).
    pub max_seq_number: u32,
    /// Lowest sequence value per tick (inclusive). Values below it are
    /// reserved: `0` for manual assignment, `1..=4` for turn-back IDs.
    ///
    /// Values `1..=4` are accepted but let the drift strategy issue a
    /// turn-back ID equal to an ID it issued before the clock rollback. Keep
    /// it at `5` or above unless the clock is known never to move backward.
    pub min_seq_number: u32,
    /// How many drifted ticks one over-cost term may accumulate before the
    /// generator waits for the real clock.
    pub top_over_cost_count: u32,
    /// Guard the drift engine with a blocking mutex. When `false` the caller
    /// must serialize calls; overlapping calls fail with
    /// [`Error::ConcurrentAccess`].
    pub lock: bool,
    /// Pause inserted before every turn-back ID so the backward tick range is
    /// not exhausted faster than the clock recovers. `0` disables it; at most
    /// 1000.
    pub turn_back_delay_ms: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            method: Method::Drift,
            base_time: DEFAULT_BASE_TIME,
            worker_id: 0,
            worker_id_bit_length: DEFAULT_BIT_LENGTH,
            seq_bit_length: DEFAULT_BIT_LENGTH,
            max_seq_number: 0,
            min_seq_number: 5,
            top_over_cost_count: 2000,
            lock: false,
            turn_back_delay_ms: 10,
        }
    }
}

impl Options {
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_base_time(mut self, base_time: u64) -> Self {
        self.base_time = base_time;
        self
    }

    pub fn with_worker_id(mut self, worker_id: u32) -> Self {
        self.worker_id = worker_id;
        self
    }

    pub fn with_worker_id_bit_length(mut self, bits: u8) -> Self {
        self.worker_id_bit_length = bits;
        self
    }

    pub fn with_seq_bit_length(mut self, bits: u8) -> Self {
        self.seq_bit_length = bits;
        self
    }

    pub fn with_max_seq_number(mut self, max: u32) -> Self {
        self.max_seq_number = max;
        self
    }

    pub fn with_min_seq_number(mut self, min: u32) -> Self {
        self.min_seq_number = min;
        self
    }

    pub fn with_top_over_cost_count(mut self, count: u32) -> Self {
        self.top_over_cost_count = count;
        self
    }

    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_turn_back_delay_ms(mut self, delay_ms: u64) -> Self {
        self.turn_back_delay_ms = delay_ms;
        self
    }

    /// Validates the options against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first field that violates
    /// its range.
    pub fn validate(&self) -> Result<Config> {
        self.validate_at(SystemClock.current_millis())
    }

    /// Validates the options, treating `now_ms` (Unix milliseconds) as the
    /// current time for the `base_time` window.
    ///
    /// Either every field is accepted and a [`Config`] is returned, or nothing
    /// is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first field that violates
    /// its range.
    pub fn validate_at(&self, now_ms: u64) -> Result<Config> {
        let seq_bits = or_default(self.seq_bit_length, DEFAULT_BIT_LENGTH);
        if !(2..=21).contains(&seq_bits) {
            return Err(Error::invalid_config(
                "seq_bit_length",
                format!("{seq_bits} is outside [2, 21]"),
            ));
        }

        let worker_bits = or_default(self.worker_id_bit_length, DEFAULT_BIT_LENGTH);
        if !(1..=21).contains(&worker_bits) {
            return Err(Error::invalid_config(
                "worker_id_bit_length",
                format!("{worker_bits} is outside [1, 21]"),
            ));
        }

        if worker_bits + seq_bits > MAX_NON_TIME_BITS {
            return Err(Error::invalid_config(
                "worker_id_bit_length",
                format!(
                    "worker_id_bit_length + seq_bit_length = {} exceeds {MAX_NON_TIME_BITS}",
                    worker_bits + seq_bits
                ),
            ));
        }

        let base_time = if self.base_time == 0 {
            DEFAULT_BASE_TIME
        } else {
            self.base_time
        };
        if base_time > now_ms {
            return Err(Error::invalid_config(
                "base_time",
                format!("{base_time} is in the future (now {now_ms})"),
            ));
        }
        if base_time < now_ms.saturating_sub(BASE_TIME_WINDOW_MS) {
            return Err(Error::invalid_config(
                "base_time",
                format!("{base_time} is more than 50 years in the past"),
            ));
        }

        let layout = Layout::new(worker_bits, seq_bits);

        let worker_id = u64::from(self.worker_id);
        if worker_id > layout.max_worker_id() {
            return Err(Error::invalid_config(
                "worker_id",
                format!("{worker_id} is outside [0, {}]", layout.max_worker_id()),
            ));
        }

        let max_seq_number = match u64::from(self.max_seq_number) {
            0 => layout.max_sequence(),
            max if max > layout.max_sequence() => {
                return Err(Error::invalid_config(
                    "max_seq_number",
                    format!("{max} is outside [1, {}]", layout.max_sequence()),
                ));
            }
            max => max,
        };

        let min_seq_number = u64::from(self.min_seq_number);
        if min_seq_number < 1 || min_seq_number > max_seq_number {
            return Err(Error::invalid_config(
                "min_seq_number",
                format!("{min_seq_number} is outside [1, {max_seq_number}]"),
            ));
        }

        if self.top_over_cost_count == 0 {
            return Err(Error::invalid_config(
                "top_over_cost_count",
                "must be greater than 0",
            ));
        }

        if self.turn_back_delay_ms > MAX_TURN_BACK_DELAY_MS {
            return Err(Error::invalid_config(
                "turn_back_delay_ms",
                format!(
                    "{} is outside [0, {MAX_TURN_BACK_DELAY_MS}]",
                    self.turn_back_delay_ms
                ),
            ));
        }

        #[cfg(feature = "tracing")]
        if self.method.in_process() == Method::Drift && min_seq_number <= MAX_TURN_BACK_INDEX {
            tracing::warn!(
                min_seq_number,
                "min_seq_number overlaps the turn-back range 1..={MAX_TURN_BACK_INDEX}, \
                 IDs issued after a clock rollback may repeat"
            );
        }

        Ok(Config {
            method: self.method,
            base_time,
            worker_id,
            layout,
            max_seq_number,
            min_seq_number,
            top_over_cost_count: u64::from(self.top_over_cost_count),
            lock: self.lock,
            turn_back_delay: Duration::from_millis(self.turn_back_delay_ms),
        })
    }
}

fn or_default(bits: u8, default: u8) -> u8 {
    if bits == 0 { default } else { bits }
}

/// Validated, immutable generator configuration.
///
/// Only obtainable through [`Options::validate`] or [`Options::validate_at`],
/// so every `Config` satisfies the documented ranges. Cheap to copy and safe
/// to share read-only between generators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    method: Method,
    base_time: u64,
    worker_id: u64,
    layout: Layout,
    max_seq_number: u64,
    min_seq_number: u64,
    top_over_cost_count: u64,
    lock: bool,
    turn_back_delay: Duration,
}

impl Config {
    pub const fn method(&self) -> Method {
        self.method
    }

    pub const fn base_time(&self) -> u64 {
        self.base_time
    }

    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub const fn layout(&self) -> Layout {
        self.layout
    }

    pub const fn max_seq_number(&self) -> u64 {
        self.max_seq_number
    }

    pub const fn min_seq_number(&self) -> u64 {
        self.min_seq_number
    }

    pub const fn top_over_cost_count(&self) -> u64 {
        self.top_over_cost_count
    }

    pub const fn lock(&self) -> bool {
        self.lock
    }

    pub const fn turn_back_delay(&self) -> Duration {
        self.turn_back_delay
    }

    /// Whether every turn-back index (`1..=4`) lies below `min_seq_number`, so
    /// turn-back IDs can never repeat a regular ID.
    pub const fn reserves_turn_back_sequences(&self) -> bool {
        self.min_seq_number > MAX_TURN_BACK_INDEX
    }

    /// Packs a time-tick and sequence with this worker's code.
    pub const fn encode(&self, time_tick: u64, sequence: u64) -> u64 {
        self.layout.encode(time_tick, self.worker_id, sequence)
    }

    /// Splits an ID issued under this configuration into its components.
    ///
    /// # Example
    ///
    /// ```
    /// use driftid::Options;
    ///
    /// let config = Options::default().with_worker_id(7).validate().unwrap();
    /// let parts = config.decode(config.encode(100, 5));
    /// assert_eq!((parts.time_tick, parts.worker_id, parts.sequence), (100, 7, 5));
    /// ```
    pub const fn decode(&self, id: u64) -> IdParts {
        self.layout.decode(id)
    }

    /// Converts a decoded time-tick back to Unix milliseconds.
    ///
    /// Drifted and turned-back IDs produce synthetic times here.
    pub const fn timestamp_millis(&self, parts: &IdParts) -> u64 {
        self.base_time + parts.time_tick
    }

    /// Time-tick for a Unix millisecond reading. Readings before `base_time`
    /// clamp to `0`.
    pub(crate) const fn time_tick(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.base_time)
    }
}
