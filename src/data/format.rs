//! Settings blob format shared by the recorder and the player

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::warn;

use super::{KeyStateSnapshot, Macro};

/// The persisted settings blob
///
/// Holds the stored macros, the in-progress recording and the playback
/// options. Unrecognized keys are ignored; missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBlob {
    /// Stored macros, oldest first
    #[serde(default)]
    pub macros: Vec<Macro>,

    /// Snapshots of the recording in progress
    #[serde(default)]
    pub current_recording: Vec<KeyStateSnapshot>,

    /// Whether a recording session is active
    #[serde(default)]
    pub is_recording: bool,

    /// Playback options
    #[serde(flatten)]
    pub playback: PlaybackOptions,
}

impl SettingsBlob {
    /// Look up a macro by identifier
    pub fn find_macro(&self, id: &str) -> Option<&Macro> {
        self.macros.iter().find(|m| m.id() == id)
    }

    /// The most recently recorded macro
    pub fn latest_macro(&self) -> Option<&Macro> {
        self.macros.last()
    }
}

/// Options read at the start of every playback session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackOptions {
    /// Delay after each full pass before looping (ms)
    #[serde(
        default = "default_delay_between_replays",
        deserialize_with = "deserialize_non_negative_ms"
    )]
    pub delay_between_replays: u64,

    /// Added to every recorded delay (ms); may be negative
    #[serde(default, deserialize_with = "deserialize_signed_ms")]
    pub delay_offset: i64,

    /// Skip the delay before the first snapshot of a pass
    #[serde(default)]
    pub ignore_start_delay: bool,

    /// Skip all delays
    #[serde(default)]
    pub instant: bool,

    /// Replay mouse button transitions
    #[serde(default)]
    pub play_mouse: bool,
}

fn default_delay_between_replays() -> u64 {
    1000
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            delay_between_replays: default_delay_between_replays(),
            delay_offset: 0,
            ignore_start_delay: false,
            instant: false,
            play_mouse: false,
        }
    }
}

impl PlaybackOptions {
    /// Wait before applying a snapshot recorded `elapsed_ms` after its predecessor.
    /// Clamped at zero when the offset is negative.
    pub fn event_delay(&self, elapsed_ms: u64) -> Duration {
        let elapsed = i64::try_from(elapsed_ms).unwrap_or(i64::MAX);
        let ms = elapsed.saturating_add(self.delay_offset).max(0);
        Duration::from_millis(ms as u64)
    }

    /// Wait between two passes over the macro
    pub fn replay_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_replays)
    }
}

/// Host settings UIs store numbers as strings as often as integers
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LenientNumber {
    fn into_ms(self, field: &str) -> i64 {
        match self {
            LenientNumber::Int(v) => v,
            LenientNumber::Float(v) => v.round() as i64,
            LenientNumber::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return 0;
                }
                match trimmed.parse::<f64>() {
                    Ok(v) => v.round() as i64,
                    Err(_) => {
                        warn!("Ignoring unparsable {} value: {:?}", field, s);
                        0
                    }
                }
            }
        }
    }
}

fn deserialize_signed_ms<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LenientNumber::deserialize(deserializer)?.into_ms("delayOffset"))
}

fn deserialize_non_negative_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = LenientNumber::deserialize(deserializer)?.into_ms("delayBetweenReplays");
    Ok(ms.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_blob() {
        let blob: SettingsBlob = serde_json::from_str("{}").unwrap();
        assert!(blob.macros.is_empty());
        assert!(!blob.is_recording);
        assert_eq!(blob.playback, PlaybackOptions::default());
        assert_eq!(blob.playback.delay_between_replays, 1000);
    }

    #[test]
    fn test_parse_host_blob() {
        let json = r#"{
            "macros": [{"id": "test_macro", "events": [
                {"keyState": {"LEFT CTRL": true}, "duration": 100},
                {"keyState": {"LEFT CTRL": false}, "duration": 100}
            ]}],
            "delayBetweenReplays": 500,
            "delayOffset": "-20",
            "ignoreStartDelay": false,
            "instant": false,
            "playMouse": true,
            "someOtherPluginKey": 7
        }"#;
        let blob: SettingsBlob = serde_json::from_str(json).unwrap();
        assert_eq!(blob.macros.len(), 1);
        assert_eq!(blob.macros[0].events().len(), 2);
        assert_eq!(blob.playback.delay_between_replays, 500);
        assert_eq!(blob.playback.delay_offset, -20);
        assert!(blob.playback.play_mouse);
    }

    #[test]
    fn test_offset_accepts_integer_and_blank_string() {
        let blob: SettingsBlob = serde_json::from_str(r#"{"delayOffset": 15}"#).unwrap();
        assert_eq!(blob.playback.delay_offset, 15);
        let blob: SettingsBlob = serde_json::from_str(r#"{"delayOffset": ""}"#).unwrap();
        assert_eq!(blob.playback.delay_offset, 0);
        let blob: SettingsBlob = serde_json::from_str(r#"{"delayOffset": "soon"}"#).unwrap();
        assert_eq!(blob.playback.delay_offset, 0);
    }

    #[test]
    fn test_event_delay_clamps_at_zero() {
        let options = PlaybackOptions {
            delay_offset: -50,
            ..PlaybackOptions::default()
        };
        assert_eq!(options.event_delay(120), Duration::from_millis(70));
        assert_eq!(options.event_delay(30), Duration::ZERO);
    }

    #[test]
    fn test_negative_replay_delay_clamped() {
        let blob: SettingsBlob =
            serde_json::from_str(r#"{"delayBetweenReplays": -5}"#).unwrap();
        assert_eq!(blob.playback.delay_between_replays, 0);
    }

    #[test]
    fn test_latest_and_find_macro() {
        let mut blob = SettingsBlob::default();
        blob.macros.push(Macro::new("first", Vec::new()));
        blob.macros.push(Macro::new("second", Vec::new()));
        assert_eq!(blob.latest_macro().map(Macro::id), Some("second"));
        assert!(blob.find_macro("first").is_some());
        assert!(blob.find_macro("missing").is_none());
    }
}
