//! Coordination-free, sortable 64-bit IDs for a fleet of workers.
//!
//! Every ID packs a time-tick (milliseconds since a configurable base time),
//! the worker code of the issuing process, and a per-tick sequence. See
//! [`Layout`] for the bit layout.
//!
//! The default [`Method::Drift`] strategy keeps issuing distinguishable,
//! per-worker monotonic IDs when a millisecond's sequence runs out (it drifts
//! ahead of the clock) and when the clock moves backward (it turns back
//! through elapsed ticks using reserved sequence values). [`Method::Classic`]
//! is the plain Snowflake algorithm that waits on exhaustion and fails on
//! rollback.
//!
//! ```
//! use driftid::{Generator, IdGenerator, Options, SystemClock};
//!
//! let options = Options::default().with_worker_id(12).with_lock(true);
//! let generator = Generator::from_options(&options, SystemClock).unwrap();
//!
//! let a = generator.try_next_id().unwrap();
//! let b = generator.try_next_id().unwrap();
//! assert!(b > a);
//! assert_eq!(generator.decode(b).worker_id, 12);
//! ```

mod config;
mod error;
mod generator;
mod id;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
