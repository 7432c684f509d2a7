use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use driftid::{Config, Method, MonotonicClock, Options, SystemClock, TimeSource};

/// Upper bound on `generate --count`, so a typo cannot stream IDs forever.
pub const MAX_COUNT: usize = 10_000_000;

/// Command-line configuration for the `driftid` binary.
///
/// Every generator option can also be supplied through a `DRIFTID_*`
/// environment variable or a `.env` file in the working directory. Values
/// left at zero fall back to their built-in defaults during validation.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "driftid",
    version,
    about = "Generate and decode drift-compensated 64-bit IDs"
)]
pub struct CliArgs {
    /// ID strategy: `drift` (1), `classic` (2), `native-drift` (3) or
    /// `native-classic` (4).
    ///
    /// Native methods fall back to the in-process strategy when no
    /// accelerator is available.
    ///
    /// Environment variable: `DRIFTID_METHOD`
    #[arg(long, env = "DRIFTID_METHOD", default_value_t = Method::Drift)]
    pub method: Method,

    /// Epoch of the time-tick field, in Unix milliseconds. Must lie within the
    /// last 50 years. `0` selects 2020-02-19T18:20:02Z.
    ///
    /// Environment variable: `DRIFTID_BASE_TIME`
    #[arg(long, env = "DRIFTID_BASE_TIME", default_value_t = 0)]
    pub base_time: u64,

    /// Worker code of this process. Must be unique among concurrently running
    /// generators.
    ///
    /// Environment variable: `DRIFTID_WORKER_ID`
    #[arg(long, env = "DRIFTID_WORKER_ID", default_value_t = 0)]
    pub worker_id: u32,

    /// Bits reserved for the worker code, `1..=21`.
    ///
    /// Environment variable: `DRIFTID_WORKER_ID_BIT_LENGTH`
    #[arg(long, env = "DRIFTID_WORKER_ID_BIT_LENGTH", default_value_t = 6)]
    pub worker_id_bit_length: u8,

    /// Bits reserved for the per-tick sequence, `2..=21`.
    ///
    /// Environment variable: `DRIFTID_SEQ_BIT_LENGTH`
    #[arg(long, env = "DRIFTID_SEQ_BIT_LENGTH", default_value_t = 6)]
    pub seq_bit_length: u8,

    /// Largest sequence value per tick. `0` uses the full sequence range.
    ///
    /// Environment variable: `DRIFTID_MAX_SEQ_NUMBER`
    #[arg(long, env = "DRIFTID_MAX_SEQ_NUMBER", default_value_t = 0)]
    pub max_seq_number: u32,

    /// First regular sequence value of a tick. Values below it are reserved
    /// for turn-back IDs; `1..=4` lets IDs repeat after a clock rollback.
    ///
    /// Environment variable: `DRIFTID_MIN_SEQ_NUMBER`
    #[arg(long, env = "DRIFTID_MIN_SEQ_NUMBER", default_value_t = 5)]
    pub min_seq_number: u32,

    /// How many ticks the drift strategy may run ahead of the clock before it
    /// waits for the clock to catch up.
    ///
    /// Environment variable: `DRIFTID_TOP_OVER_COST_COUNT`
    #[arg(long, env = "DRIFTID_TOP_OVER_COST_COUNT", default_value_t = 2000)]
    pub top_over_cost_count: u32,

    /// Serialize concurrent callers instead of rejecting overlapping calls.
    ///
    /// Environment variable: `DRIFTID_LOCK`
    #[arg(long, env = "DRIFTID_LOCK", default_value_t = false)]
    pub lock: bool,

    /// Pause before each turn-back ID, in milliseconds, at most 1000.
    ///
    /// Environment variable: `DRIFTID_TURN_BACK_DELAY_MS`
    #[arg(long, env = "DRIFTID_TURN_BACK_DELAY_MS", default_value_t = 10)]
    pub turn_back_delay_ms: u64,

    /// Time source for the generator.
    ///
    /// Environment variable: `DRIFTID_CLOCK`
    #[arg(long, env = "DRIFTID_CLOCK", value_enum, default_value_t = ClockKind::System)]
    pub clock: ClockKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print freshly generated IDs, one per line.
    Generate {
        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Print each ID as a JSON object with its decoded fields.
        #[arg(long)]
        json: bool,
    },
    /// Split IDs into their time-tick, worker code and sequence.
    Decode {
        /// IDs to decode.
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Print each ID as a JSON object.
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Wall clock. May move backward; the drift strategy compensates.
    System,
    /// Wall time at startup plus monotonic elapsed time. Never moves backward.
    Monotonic,
}

/// The clock selected on the command line.
pub enum Clock {
    System(SystemClock),
    Monotonic(MonotonicClock),
}

impl From<ClockKind> for Clock {
    fn from(kind: ClockKind) -> Self {
        match kind {
            ClockKind::System => Self::System(SystemClock::new()),
            ClockKind::Monotonic => Self::Monotonic(MonotonicClock::new()),
        }
    }
}

impl TimeSource<u64> for Clock {
    fn current_millis(&self) -> u64 {
        match self {
            Self::System(clock) => clock.current_millis(),
            Self::Monotonic(clock) => clock.current_millis(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub generator: Config,
    pub clock: ClockKind,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if let Command::Generate { count, .. } = args.command {
            if count == 0 {
                bail!("--count must be greater than 0");
            }
            if count > MAX_COUNT {
                bail!("--count ({count}) exceeds the maximum of {MAX_COUNT}");
            }
        }

        let options = Options {
            method: args.method,
            base_time: args.base_time,
            worker_id: args.worker_id,
            worker_id_bit_length: args.worker_id_bit_length,
            seq_bit_length: args.seq_bit_length,
            max_seq_number: args.max_seq_number,
            min_seq_number: args.min_seq_number,
            top_over_cost_count: args.top_over_cost_count,
            lock: args.lock,
            turn_back_delay_ms: args.turn_back_delay_ms,
        };

        Ok(Self {
            generator: options.validate()?,
            clock: args.clock,
            command: args.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<CliConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("driftid").chain(args.iter().copied()))?;
        CliConfig::try_from(args)
    }

    #[test]
    fn defaults_validate() {
        let config = parse(&["generate"]).unwrap();
        assert_eq!(config.generator.method(), Method::Drift);
        assert_eq!(config.generator.worker_id(), 0);
        assert_eq!(config.generator.min_seq_number(), 5);
        assert_eq!(config.generator.max_seq_number(), 63);
        assert_eq!(config.clock, ClockKind::System);
    }

    #[test]
    fn method_accepts_codes_and_names() {
        let config = parse(&["--method", "2", "generate"]).unwrap();
        assert_eq!(config.generator.method(), Method::Classic);

        let config = parse(&["--method", "native-drift", "generate"]).unwrap();
        assert_eq!(config.generator.method(), Method::NativeDrift);

        assert!(parse(&["--method", "9", "generate"]).is_err());
    }

    #[test]
    fn rejects_out_of_range_options() {
        let err = parse(&["--worker-id", "64", "generate"]).unwrap_err();
        assert!(err.to_string().contains("worker_id"), "{err}");

        let err = parse(&[
            "--worker-id-bit-length",
            "20",
            "--seq-bit-length",
            "10",
            "generate",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("worker_id_bit_length"), "{err}");
    }

    #[test]
    fn rejects_zero_count() {
        let err = parse(&["generate", "--count", "0"]).unwrap_err();
        assert!(err.to_string().contains("--count"), "{err}");
    }

    #[test]
    fn decode_requires_ids() {
        assert!(parse(&["decode"]).is_err());
        let config = parse(&["decode", "1", "2"]).unwrap();
        assert!(matches!(config.command, Command::Decode { ref ids, .. } if ids == &[1, 2]));
    }

    #[test]
    fn clock_kind_selects_source() {
        let config = parse(&["--clock", "monotonic", "generate"]).unwrap();
        assert_eq!(config.clock, ClockKind::Monotonic);
        assert!(matches!(Clock::from(config.clock), Clock::Monotonic(_)));
    }
}
