//! Macro engine - routes user triggers to the recorder and the player

mod engine;
mod hotkeys;

pub use engine::{create_engine_channels, MacroEngine};
pub use hotkeys::hotkey_handler;

/// Commands that can be sent to the macro engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Record action invoked: start or stop recording
    ToggleRecording,
    /// Play action invoked: start or stop playback
    TogglePlayback,
    /// The actions became visible again: reset both to idle
    Reset,
    /// Shutdown the engine
    Shutdown,
}

/// Status updates from the macro engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// Recorder is idle
    RecorderIdle,
    /// Recording in progress
    Recording,
    /// Recording saved as a macro
    MacroSaved {
        /// Identifier of the new macro
        macro_id: String,
        /// Number of recorded events
        event_count: usize,
    },
    /// Recording stopped with nothing captured
    NoEventsRecorded,
    /// Player is idle
    PlayerIdle,
    /// Playback in progress
    Playing {
        /// Identifier of the macro being played
        macro_id: String,
    },
    /// Nothing to play
    NoMacro,
    /// Selected macro has no events
    NoEventsToPlay,
    /// An error occurred
    Error(String),
}

impl EngineStatus {
    /// Title shown on the action that produced this status
    pub fn label(&self) -> &'static str {
        match self {
            EngineStatus::RecorderIdle => "Record",
            EngineStatus::Recording => "Recording...",
            EngineStatus::MacroSaved { .. } => "Saved Macro",
            EngineStatus::NoEventsRecorded => "No Events",
            EngineStatus::PlayerIdle => "Replay",
            EngineStatus::Playing { .. } => "Stop",
            EngineStatus::NoMacro => "No Macro",
            EngineStatus::NoEventsToPlay => "No events",
            EngineStatus::Error(_) => "Error",
        }
    }
}
