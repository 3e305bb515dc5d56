//! Macro player
//!
//! Replays a stored macro in a loop until stopped. Each snapshot is
//! applied after its recorded delay by diffing it against the previous
//! one and simulating only the press/release edges. A start request while
//! playing is a stop request; stopping cancels the session, which then
//! releases every key it still holds.

mod diff;
mod session;

pub use diff::{transitions, Transition};
pub use session::{PlaybackReport, StopReason};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::input::Simulator;
use crate::store::SettingsStore;
use session::PlaybackSession;

/// Player settings that come from the host configuration rather than the settings blob
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Stop automatically after this long (unbounded when `None`)
    pub max_duration: Option<Duration>,
    /// Macro to play; the most recently recorded one when `None`
    pub macro_id: Option<String>,
}

/// Observable player state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing { macro_id: String },
}

/// Result of a player request, surfaced to the user as a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback started
    Started,
    /// Playback stopped and held keys released
    Stopped,
    /// The store holds no macro to play
    NoMacro,
    /// The selected macro has no events
    NoEvents,
}

impl PlayOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PlayOutcome::Started => "Stop",
            PlayOutcome::Stopped => "Replay",
            PlayOutcome::NoMacro => "No Macro",
            PlayOutcome::NoEvents => "No events",
        }
    }
}

struct ActivePlayback {
    cancel: CancellationToken,
    task: JoinHandle<PlaybackReport>,
}

/// Plays macros through the simulation backend
pub struct Player {
    simulator: Arc<dyn Simulator>,
    store: Arc<dyn SettingsStore>,
    config: PlayerConfig,
    active: Option<ActivePlayback>,
    state_tx: Arc<watch::Sender<PlayerState>>,
}

impl Player {
    /// Create a new idle player
    pub fn new(
        simulator: Arc<dyn Simulator>,
        store: Arc<dyn SettingsStore>,
        config: PlayerConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(PlayerState::Idle);
        Self {
            simulator,
            store,
            config,
            active: None,
            state_tx: Arc::new(state_tx),
        }
    }

    /// Watch state changes, including sessions that end on their own
    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.state_tx.subscribe()
    }

    pub fn is_playing(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }

    /// Primary action: start when idle, stop when playing
    pub async fn toggle(&mut self) -> PlayOutcome {
        if self.is_playing() {
            info!("Playback stopped by user.");
            self.stop().await;
            PlayOutcome::Stopped
        } else {
            self.start().await
        }
    }

    /// Start playing the selected macro
    ///
    /// Playback options are read from the store now and stay fixed for the session.
    pub async fn start(&mut self) -> PlayOutcome {
        if self.is_playing() {
            return PlayOutcome::Started;
        }
        // A session that ended on its own still has a handle to collect
        self.stop().await;

        let blob = match self.store.read().await {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to read settings: {}", e);
                info!("No macro found");
                return PlayOutcome::NoMacro;
            }
        };

        let selected = match &self.config.macro_id {
            Some(id) => blob.find_macro(id),
            None => blob.latest_macro(),
        };
        let Some(selected) = selected else {
            info!("No macro found");
            return PlayOutcome::NoMacro;
        };
        if selected.is_empty() {
            info!("No events to play");
            return PlayOutcome::NoEvents;
        }

        let cancel = CancellationToken::new();
        let session = PlaybackSession::new(
            Arc::new(selected.clone()),
            blob.playback.clone(),
            self.config.max_duration,
            self.simulator.clone(),
            cancel.clone(),
        );

        let state_tx = self.state_tx.clone();
        state_tx.send_replace(PlayerState::Playing {
            macro_id: selected.id().to_string(),
        });
        let task = tokio::spawn(async move {
            let report = session.run().await;
            state_tx.send_replace(PlayerState::Idle);
            report
        });

        self.active = Some(ActivePlayback { cancel, task });
        PlayOutcome::Started
    }

    /// Stop the current session and wait for it to release held keys
    pub async fn stop(&mut self) -> Option<PlaybackReport> {
        let active = self.active.take()?;
        active.cancel.cancel();
        match active.task.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Playback task failed: {}", e);
                self.state_tx.send_replace(PlayerState::Idle);
                None
            }
        }
    }

    /// Return to idle, releasing any keys still held by playback
    pub async fn reset(&mut self) {
        if self.stop().await.is_some() {
            info!("Playback reset");
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        // The detached session still releases its keys once it sees the token
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}
