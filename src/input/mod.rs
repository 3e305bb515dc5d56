//! Input capture and simulation backends

mod backend;
pub mod keymap;
pub(crate) mod rdev_backend;

pub use backend::*;
pub use keymap::NativeCode;
pub use rdev_backend::{RdevHook, RdevSimulator};
