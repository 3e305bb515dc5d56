//! Data structures and serialization for recorded macros

mod events;
mod format;

pub use events::*;
pub use format::*;
