#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Config, TimeSource};

/// Turn-back episodes cycle through sequence values `1..=MAX_TURN_BACK_INDEX`.
///
/// These only stay distinct from regular IDs while `min_seq_number` is above
/// this value. See [`crate::Config::reserves_turn_back_sequences`].
pub const MAX_TURN_BACK_INDEX: u64 = 4;

/// `term_index` wraps back to zero once it passes this value.
const MAX_TERM_INDEX: u64 = 10_000;

/// The operating mode of a [`DriftEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Issuing IDs at the real clock's tick.
    Normal,
    /// The sequence ran out and the engine is issuing IDs at ticks ahead of
    /// the real clock.
    OverCost,
    /// The clock moved behind the last issued tick and the engine is issuing
    /// IDs at already elapsed ticks, walking backward.
    TurnBack,
}

/// Snapshot of a [`DriftEngine`]'s bookkeeping.
///
/// A term is one contiguous run of drifted ticks; a turn-back episode is one
/// backward walk started by a clock rollback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DriftState {
    /// Last tick an ID was issued for. Ahead of the real clock while
    /// drifting.
    pub last_time_tick: u64,
    /// Next sequence value to hand out within `last_time_tick`. A value of
    /// `max_seq_number + 1` means the tick is exhausted.
    pub current_seq_number: u64,
    pub is_over_cost: bool,
    /// Drifted ticks accumulated in the current term.
    pub over_cost_count_in_one_term: u64,
    /// IDs issued in the current term.
    pub gen_count_in_one_term: u64,
    /// Number of terms started, wrapping after 10000.
    pub term_index: u64,
    /// Next tick a turn-back ID will use; `0` when not turning back.
    pub turn_back_time_tick: u64,
    /// Sequence value used by the current turn-back episode, `1..=4`.
    pub turn_back_index: u64,
}

impl DriftState {
    pub const fn phase(&self) -> Phase {
        if self.is_over_cost {
            Phase::OverCost
        } else if self.turn_back_time_tick > 0 {
            Phase::TurnBack
        } else {
            Phase::Normal
        }
    }
}

/// The drift state machine behind the drift generators.
///
/// The engine is a plain owned value driven through `&mut self`; it performs
/// no synchronization of its own. Wrap it in [`crate::BasicDriftGenerator`]
/// for single-threaded use or [`crate::LockDriftGenerator`] to share it.
///
/// On every call the engine reads the clock once and takes one transition:
///
/// - **Normal**: a new tick resets the sequence to `min_seq_number`; the same
///   tick hands out the next sequence value. When the sequence is exhausted
///   the engine enters **OverCost** instead of waiting.
/// - **OverCost**: the engine advances its tick one past the previous one
///   each time the sequence runs out, staying ahead of the real clock. The
///   term ends as soon as the real clock passes the drifted tick, or, after
///   `top_over_cost_count` drifted ticks, by spinning until it does.
/// - **TurnBack**: when the clock reads behind the last issued tick, IDs are
///   issued at decreasing ticks below it, with the turn-back index as the
///   sequence. These sort before everything issued earlier at the last tick
///   and never collide with regular sequence values, provided
///   `min_seq_number` is above [`MAX_TURN_BACK_INDEX`].
///
/// # Uniqueness
///
/// With `min_seq_number` in `1..=4` the turn-back indices overlap the regular
/// sequence range. A turn-back ID can then repeat an ID issued earlier at the
/// same elapsed tick, so such a configuration does not guarantee unique IDs
/// across a clock rollback. The same holds when the sequence field is too
/// narrow to hold index `4`.
///
/// # Blocking
///
/// A forced resync spins (yielding between polls) until the clock passes the
/// drifted tick. A clock that never advances blocks that call forever. Each
/// turn-back ID is preceded by the configured turn-back delay.
///
/// # Example
///
/// ```
/// use driftid::{DriftEngine, Options, SystemClock};
///
/// let config = Options::default().with_worker_id(1).validate().unwrap();
/// let mut engine = DriftEngine::new(config, SystemClock);
///
/// let a = engine.next_id();
/// let b = engine.next_id();
/// assert!(b > a);
/// assert_eq!(config.decode(a).worker_id, 1);
/// ```
#[derive(Debug)]
pub struct DriftEngine<T> {
    config: Config,
    clock: T,
    state: DriftState,
}

impl<T> DriftEngine<T>
where
    T: TimeSource<u64>,
{
    pub fn new(config: Config, clock: T) -> Self {
        let state = DriftState {
            current_seq_number: config.min_seq_number(),
            ..DriftState::default()
        };
        Self {
            config,
            clock,
            state,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> DriftState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Generates the next ID. Never fails; clock rollbacks are absorbed by
    /// turning back.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&mut self) -> u64 {
        if self.state.is_over_cost {
            self.next_over_cost_id()
        } else {
            self.next_normal_id()
        }
    }

    fn next_normal_id(&mut self) -> u64 {
        let now = self.current_time_tick();

        if now < self.state.last_time_tick {
            return self.cold_turn_back(now);
        }

        if self.state.turn_back_time_tick > 0 {
            #[cfg(feature = "tracing")]
            tracing::info!(
                tick = now,
                index = self.state.turn_back_index,
                "clock caught up, turn-back ended"
            );
            self.state.turn_back_time_tick = 0;
        }

        if now > self.state.last_time_tick {
            self.state.last_time_tick = now;
            self.state.current_seq_number = self.config.min_seq_number();
            return self.calc_id(now);
        }

        if self.state.current_seq_number > self.config.max_seq_number() {
            return self.begin_over_cost();
        }

        self.state.gen_count_in_one_term += 1;
        self.calc_id(self.state.last_time_tick)
    }

    fn next_over_cost_id(&mut self) -> u64 {
        let now = self.current_time_tick();

        if now > self.state.last_time_tick {
            self.end_over_cost(now);
            return self.calc_id(now);
        }

        if self.state.over_cost_count_in_one_term >= self.config.top_over_cost_count() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                drifted_tick = self.state.last_time_tick,
                tick = now,
                "over-cost limit reached, waiting for the clock"
            );
            let next = self.next_time_tick();
            self.end_over_cost(next);
            return self.calc_id(next);
        }

        if self.state.current_seq_number > self.config.max_seq_number() {
            self.state.last_time_tick += 1;
            self.state.current_seq_number = self.config.min_seq_number();
            self.state.over_cost_count_in_one_term += 1;
            self.state.gen_count_in_one_term += 1;
            return self.calc_id(self.state.last_time_tick);
        }

        self.state.gen_count_in_one_term += 1;
        self.calc_id(self.state.last_time_tick)
    }

    fn begin_over_cost(&mut self) -> u64 {
        self.state.term_index += 1;
        self.state.last_time_tick += 1;
        self.state.current_seq_number = self.config.min_seq_number();
        self.state.is_over_cost = true;
        self.state.over_cost_count_in_one_term = 1;
        self.state.gen_count_in_one_term = 1;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            term = self.state.term_index,
            drifted_tick = self.state.last_time_tick,
            "sequence exhausted, drifting ahead of the clock"
        );

        self.calc_id(self.state.last_time_tick)
    }

    fn end_over_cost(&mut self, tick: u64) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            term = self.state.term_index,
            drifted_ticks = self.state.over_cost_count_in_one_term,
            generated = self.state.gen_count_in_one_term,
            "over-cost term ended"
        );

        if self.state.term_index > MAX_TERM_INDEX {
            self.state.term_index = 0;
        }
        self.state.last_time_tick = tick;
        self.state.current_seq_number = self.config.min_seq_number();
        self.state.is_over_cost = false;
        self.state.over_cost_count_in_one_term = 0;
        self.state.gen_count_in_one_term = 0;
    }

    #[cold]
    #[inline(never)]
    fn cold_turn_back(&mut self, _now: u64) -> u64 {
        if self.state.turn_back_time_tick < 1 {
            self.state.turn_back_time_tick = self.state.last_time_tick.saturating_sub(1);
            self.state.turn_back_index = if self.state.turn_back_index >= MAX_TURN_BACK_INDEX {
                1
            } else {
                self.state.turn_back_index + 1
            };

            #[cfg(feature = "tracing")]
            tracing::warn!(
                last_tick = self.state.last_time_tick,
                tick = _now,
                index = self.state.turn_back_index,
                "clock moved backwards, turning back"
            );
        }

        let delay = self.config.turn_back_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let id = self
            .config
            .encode(self.state.turn_back_time_tick, self.state.turn_back_index);
        self.state.turn_back_time_tick = self.state.turn_back_time_tick.saturating_sub(1);
        id
    }

    /// Encodes `tick` with the current sequence, then advances the sequence.
    fn calc_id(&mut self, tick: u64) -> u64 {
        let id = self.config.encode(tick, self.state.current_seq_number);
        self.state.current_seq_number += 1;
        id
    }

    fn current_time_tick(&self) -> u64 {
        self.config.time_tick(self.clock.current_millis())
    }

    /// Polls the clock until it passes `last_time_tick`.
    fn next_time_tick(&self) -> u64 {
        loop {
            let tick = self.current_time_tick();
            if tick > self.state.last_time_tick {
                break tick;
            }
            core::hint::spin_loop();
            std::thread::yield_now();
        }
    }
}
