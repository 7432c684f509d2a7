use core::{fmt, str::FromStr};
use std::sync::Arc;

use crate::{
    ClassicGenerator, Config, Error, IdGenerator, IdParts, LockDriftGenerator, Options, Result,
    TimeSource,
};

/// Which ID strategy a [`Generator`] runs.
///
/// Parses from the numeric codes `1..=4` or from the kebab-case names.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// In-process drift engine: absorbs sequence exhaustion and clock
    /// rollbacks.
    #[default]
    Drift,
    /// In-process classic Snowflake: waits on exhaustion, fails on rollback.
    Classic,
    /// External accelerated drift implementation, falling back to
    /// [`Method::Drift`].
    NativeDrift,
    /// External accelerated classic implementation, falling back to
    /// [`Method::Classic`].
    NativeClassic,
}

impl Method {
    pub const fn is_native(self) -> bool {
        matches!(self, Self::NativeDrift | Self::NativeClassic)
    }

    /// The in-process method implementing the same algorithm.
    pub const fn in_process(self) -> Self {
        match self {
            Self::Drift | Self::NativeDrift => Self::Drift,
            Self::Classic | Self::NativeClassic => Self::Classic,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drift => "drift",
            Self::Classic => "classic",
            Self::NativeDrift => "native-drift",
            Self::NativeClassic => "native-classic",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "drift" => Ok(Self::Drift),
            "2" | "classic" => Ok(Self::Classic),
            "3" | "native-drift" => Ok(Self::NativeDrift),
            "4" | "native-classic" => Ok(Self::NativeClassic),
            other => Err(Error::invalid_config(
                "method",
                format!("unknown method `{other}`"),
            )),
        }
    }
}

/// An external, accelerated implementation of the [`IdGenerator`] contract.
///
/// The selector asks [`Accelerator::supports`] once, at construction. An
/// accelerator that reports support takes over every call for the lifetime of
/// the [`Generator`].
pub trait Accelerator: IdGenerator + Send + Sync {
    /// Whether this implementation can serve `method`.
    fn supports(&self, method: Method) -> bool;
}

enum Strategy<T> {
    Drift(LockDriftGenerator<T>),
    Classic(ClassicGenerator<T>),
    Native(Arc<dyn Accelerator>),
}

/// Runs the strategy named by [`Config::method`] behind the shared
/// [`IdGenerator`] contract.
///
/// The choice is made once in the constructor and never changes. Native
/// methods require a capable [`Accelerator`]; without one the in-process
/// strategy of the same algorithm is used instead.
///
/// # Example
///
/// ```
/// use driftid::{Generator, IdGenerator, Options, SystemClock};
///
/// let options = Options::default().with_worker_id(5).with_lock(true);
/// let generator = Generator::from_options(&options, SystemClock).unwrap();
///
/// let id = generator.try_next_id().unwrap();
/// assert_eq!(generator.decode(id).worker_id, 5);
/// ```
pub struct Generator<T> {
    config: Config,
    active: Method,
    strategy: Strategy<T>,
}

impl<T> Generator<T>
where
    T: TimeSource<u64>,
{
    /// Builds the in-process strategy for an already validated config.
    pub fn new(config: Config, clock: T) -> Self {
        Self::with_accelerator(config, clock, None)
    }

    /// Validates `options` against the wall clock and builds the generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any option is out of range.
    pub fn from_options(options: &Options, clock: T) -> Result<Self> {
        Ok(Self::new(options.validate()?, clock))
    }

    /// Builds the generator, delegating to `accelerator` when the configured
    /// method is native and the accelerator supports it.
    pub fn with_accelerator(
        config: Config,
        clock: T,
        accelerator: Option<Arc<dyn Accelerator>>,
    ) -> Self {
        let method = config.method();

        if method.is_native() {
            match accelerator {
                Some(accelerator) if accelerator.supports(method) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%method, "using accelerated implementation");
                    return Self {
                        config,
                        active: method,
                        strategy: Strategy::Native(accelerator),
                    };
                }
                _ => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        %method,
                        fallback = %method.in_process(),
                        "no capable accelerator, using in-process strategy"
                    );
                }
            }
        }

        let active = method.in_process();
        let strategy = match active {
            Method::Classic => Strategy::Classic(ClassicGenerator::new(config, clock)),
            _ => Strategy::Drift(LockDriftGenerator::new(config, clock)),
        };
        Self {
            config,
            active,
            strategy,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The method actually serving calls. Differs from the configured method
    /// when a native method fell back to its in-process counterpart.
    pub fn active_method(&self) -> Method {
        self.active
    }

    pub fn decode(&self, id: u64) -> IdParts {
        self.config.decode(id)
    }

    /// Generates the next ID using the selected strategy.
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::try_next_id`].
    pub fn try_next_id(&self) -> Result<u64> {
        match &self.strategy {
            Strategy::Drift(generator) => generator.try_next_id(),
            Strategy::Classic(generator) => generator.try_next_id(),
            Strategy::Native(accelerator) => accelerator.try_next_id(),
        }
    }
}

impl<T> IdGenerator for Generator<T>
where
    T: TimeSource<u64>,
{
    fn try_next_id(&self) -> Result<u64> {
        self.try_next_id()
    }
}
