mod layout;
mod parts;

pub use layout::*;
pub use parts::*;
