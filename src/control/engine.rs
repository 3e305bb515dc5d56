//! Macro engine
//!
//! Owns one recorder and one player, applies commands to them in order and
//! broadcasts the resulting status. Player state changes (including
//! sessions that stop on their own) arrive through the player's watch
//! channel.

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};

use crate::player::{PlayOutcome, Player, PlayerState};
use crate::recorder::{RecordOutcome, Recorder};

use super::{EngineCommand, EngineStatus};

/// The macro engine coordinates recording and playback
pub struct MacroEngine {
    /// Recorder bound to the record action
    recorder: Recorder,
    /// Player bound to the play action
    player: Player,
    /// Command receiver
    cmd_rx: mpsc::Receiver<EngineCommand>,
    /// Status broadcaster
    status_tx: broadcast::Sender<EngineStatus>,
}

impl MacroEngine {
    /// Create a new macro engine
    pub fn new(
        recorder: Recorder,
        player: Player,
        cmd_rx: mpsc::Receiver<EngineCommand>,
        status_tx: broadcast::Sender<EngineStatus>,
    ) -> Self {
        Self {
            recorder,
            player,
            cmd_rx,
            status_tx,
        }
    }

    /// Run the engine main loop
    pub async fn run(&mut self) -> Result<()> {
        info!("Macro engine starting");

        let mut player_state = self.player.subscribe_state();

        // Broadcast initial status
        self.publish(EngineStatus::RecorderIdle);
        self.publish(EngineStatus::PlayerIdle);

        loop {
            tokio::select! {
                // Handle commands
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(EngineCommand::ToggleRecording) => self.toggle_recording().await,
                        Some(EngineCommand::TogglePlayback) => self.toggle_playback().await,
                        Some(EngineCommand::Reset) => {
                            info!("Resetting recorder and player");
                            self.recorder.reset().await;
                            self.player.reset().await;
                            self.publish(EngineStatus::RecorderIdle);
                        }
                        Some(EngineCommand::Shutdown) | None => {
                            info!("Shutdown command received");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                // Playback started or ended
                Ok(()) = player_state.changed() => {
                    let status = match &*player_state.borrow_and_update() {
                        PlayerState::Idle => EngineStatus::PlayerIdle,
                        PlayerState::Playing { macro_id } => EngineStatus::Playing {
                            macro_id: macro_id.clone(),
                        },
                    };
                    self.publish(status);
                }
            }
        }

        info!("Macro engine stopped");
        Ok(())
    }

    async fn toggle_recording(&mut self) {
        let status = match self.recorder.toggle().await {
            Ok(RecordOutcome::Idle) => EngineStatus::RecorderIdle,
            Ok(RecordOutcome::Started) => EngineStatus::Recording,
            Ok(RecordOutcome::Saved(recorded)) => EngineStatus::MacroSaved {
                macro_id: recorded.id().to_string(),
                event_count: recorded.events().len(),
            },
            Ok(RecordOutcome::NoEvents) => EngineStatus::NoEventsRecorded,
            Err(e) => {
                error!("Failed to start recording: {}", e);
                EngineStatus::Error(e.to_string())
            }
        };
        self.publish(status);
    }

    async fn toggle_playback(&mut self) {
        // Started/Stopped are reported through the player state channel
        match self.player.toggle().await {
            PlayOutcome::NoMacro => self.publish(EngineStatus::NoMacro),
            PlayOutcome::NoEvents => self.publish(EngineStatus::NoEventsToPlay),
            PlayOutcome::Started | PlayOutcome::Stopped => {}
        }
    }

    async fn shutdown(&mut self) {
        if self.recorder.is_recording() {
            let outcome = self.recorder.stop().await;
            info!("Recording closed on shutdown: {}", outcome.label());
        }
        if let Some(report) = self.player.stop().await {
            debug!("Playback closed on shutdown: {:?}", report);
        }
        self.publish(EngineStatus::RecorderIdle);
        self.publish(EngineStatus::PlayerIdle);
    }

    fn publish(&self, status: EngineStatus) {
        info!("Status: {} ({:?})", status.label(), status);
        let _ = self.status_tx.send(status);
    }
}

/// Create channels for engine communication
pub fn create_engine_channels() -> (
    mpsc::Sender<EngineCommand>,
    mpsc::Receiver<EngineCommand>,
    broadcast::Sender<EngineStatus>,
    broadcast::Receiver<EngineStatus>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (status_tx, status_rx) = broadcast::channel(16);
    (cmd_tx, cmd_rx, status_tx, status_rx)
}
