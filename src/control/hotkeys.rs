//! Global hotkeys delivered through the input hook

use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::input::{InputHandler, RawInput};

use super::EngineCommand;

/// Build a hook handler that turns hotkey presses into engine commands
///
/// Auto-repeat presses are ignored until the key is released.
pub fn hotkey_handler(
    record_key: String,
    play_key: String,
    cmd_tx: mpsc::Sender<EngineCommand>,
) -> InputHandler {
    let held = Mutex::new(HashSet::new());

    Box::new(move |input: RawInput| {
        let command = if input.key == record_key {
            EngineCommand::ToggleRecording
        } else if input.key == play_key {
            EngineCommand::TogglePlayback
        } else {
            return;
        };

        let mut held = held.lock().unwrap_or_else(|e| e.into_inner());
        if !input.pressed {
            held.remove(&input.key);
            return;
        }
        if !held.insert(input.key.clone()) {
            return;
        }

        debug!("Hotkey {} -> {:?}", input.key, command);
        if let Err(e) = cmd_tx.try_send(command) {
            warn!("Dropped hotkey command: {}", e);
        }
    })
}
