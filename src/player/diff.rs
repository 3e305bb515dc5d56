//! Press/release edges between consecutive key states

use crate::data::KeyState;

/// A press or release edge for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<'a> {
    pub key: &'a str,
    pub pressed: bool,
}

/// Edges needed to move from `previous` to `next`
///
/// Only keys present in `next` are considered; a key absent from
/// `previous` counts as released. Keys whose state is unchanged yield
/// nothing, so held keys are never re-pressed.
pub fn transitions<'a>(previous: &KeyState, next: &'a KeyState) -> Vec<Transition<'a>> {
    next.iter()
        .filter(|(key, pressed)| previous.get(key.as_str()).copied().unwrap_or(false) != **pressed)
        .map(|(key, pressed)| Transition {
            key: key.as_str(),
            pressed: *pressed,
        })
        .collect()
}
