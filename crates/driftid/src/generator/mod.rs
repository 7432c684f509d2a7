mod classic;
mod drift;
mod interface;
mod mutex;
mod selector;
#[cfg(test)]
mod tests;

pub use classic::*;
pub use drift::*;
pub use interface::*;
pub(crate) use mutex::*;
pub use selector::*;
