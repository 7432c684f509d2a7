mod basic;
mod engine;
mod lock;

pub use basic::*;
pub use engine::*;
pub use lock::*;
