//! Recorded event data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pressed/released state per key identifier (e.g. `"A"`, `"LEFT SHIFT"`, `"MOUSE LEFT"`).
pub type KeyState = BTreeMap<String, bool>;

/// A point-in-time key state captured by the recorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStateSnapshot {
    /// Every key held at capture time, plus the key whose state just changed
    #[serde(rename = "keyState", default)]
    pub key_state: KeyState,

    /// Milliseconds since the previous snapshot (or since recording start for the first one)
    #[serde(rename = "duration", default)]
    pub elapsed_ms: u64,
}

impl KeyStateSnapshot {
    /// Create a new snapshot
    pub fn new(key_state: KeyState, elapsed_ms: u64) -> Self {
        Self {
            key_state,
            elapsed_ms,
        }
    }
}

/// A named, ordered sequence of snapshots
///
/// Macros are immutable once created; the recorder only builds them from a
/// non-empty buffer. A hand-edited settings blob may still carry an empty
/// one, which the player reports as having no events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    id: String,
    #[serde(default)]
    events: Vec<KeyStateSnapshot>,
}

impl Macro {
    /// Create a macro with an explicit identifier
    pub fn new(id: impl Into<String>, events: Vec<KeyStateSnapshot>) -> Self {
        Self {
            id: id.into(),
            events,
        }
    }

    /// Seal a recording buffer into a macro with a fresh unique identifier.
    /// Returns `None` for an empty buffer.
    pub fn seal(events: Vec<KeyStateSnapshot>) -> Option<Self> {
        if events.is_empty() {
            return None;
        }
        Some(Self::new(new_macro_id(), events))
    }

    /// Unique identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshots in playback order
    pub fn events(&self) -> &[KeyStateSnapshot] {
        &self.events
    }

    /// Check if the macro has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of all recorded delays in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.events
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.elapsed_ms))
    }
}

/// Random identifiers; wall-clock derived ones collide on rapid consecutive recordings
fn new_macro_id() -> String {
    format!("macro_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, bool)], elapsed_ms: u64) -> KeyStateSnapshot {
        let key_state = entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        KeyStateSnapshot::new(key_state, elapsed_ms)
    }

    #[test]
    fn test_snapshot_json_shape() {
        let event = snapshot(&[("A", true)], 120);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"keyState": {"A": true}, "duration": 120}));
    }

    #[test]
    fn test_seal_empty_buffer() {
        assert!(Macro::seal(Vec::new()).is_none());
    }

    #[test]
    fn test_seal_generates_distinct_ids() {
        let events = vec![snapshot(&[("A", true)], 0)];
        let first = Macro::seal(events.clone()).unwrap();
        let second = Macro::seal(events).unwrap();
        assert!(first.id().starts_with("macro_"));
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_duration_sums_event_delays() {
        let m = Macro::new(
            "m",
            vec![
                snapshot(&[("LEFT CTRL", true), ("A", false)], 40),
                snapshot(&[("LEFT CTRL", true), ("A", true)], 60),
            ],
        );
        assert_eq!(m.duration_ms(), 100);
    }
}
