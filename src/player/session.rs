//! The replay loop for one playback session

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::data::{KeyState, KeyStateSnapshot, Macro, PlaybackOptions};
use crate::input::keymap::{self, NativeCode};
use crate::input::Simulator;

use super::diff::transitions;

/// Why a playback session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop was requested
    Cancelled,
    /// The configured maximum duration elapsed
    MaxDuration,
}

/// Summary of a finished playback session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackReport {
    pub macro_id: String,
    /// Completed passes over the macro
    pub passes: u64,
    /// Simulation calls that succeeded
    pub transitions: u64,
    /// Transitions skipped for lack of a key mapping
    pub unmapped: u64,
    /// Simulation calls that failed
    pub failures: u64,
    pub stop_reason: StopReason,
}

/// One playback run
///
/// Owns the previous key state; the only way in from outside is the
/// cancellation token, which is raced against every wait and checked
/// before every transition.
pub(crate) struct PlaybackSession {
    recorded: Arc<Macro>,
    options: PlaybackOptions,
    max_duration: Option<Duration>,
    simulator: Arc<dyn Simulator>,
    cancel: CancellationToken,
    previous: KeyState,
    deadline: Option<Instant>,
    report: PlaybackReport,
}

impl PlaybackSession {
    pub(crate) fn new(
        recorded: Arc<Macro>,
        options: PlaybackOptions,
        max_duration: Option<Duration>,
        simulator: Arc<dyn Simulator>,
        cancel: CancellationToken,
    ) -> Self {
        let report = PlaybackReport {
            macro_id: recorded.id().to_string(),
            passes: 0,
            transitions: 0,
            unmapped: 0,
            failures: 0,
            stop_reason: StopReason::Cancelled,
        };
        Self {
            recorded,
            options,
            max_duration,
            simulator,
            cancel,
            previous: KeyState::new(),
            deadline: None,
            report,
        }
    }

    /// Replay until cancelled (or the safety limit elapses), then release held keys
    pub(crate) async fn run(mut self) -> PlaybackReport {
        self.deadline = self.max_duration.map(|limit| Instant::now() + limit);
        info!(
            "Started playback of macro {} ({} events)",
            self.report.macro_id,
            self.recorded.events().len()
        );

        let reason = match self.play_passes().await {
            Ok(()) => StopReason::Cancelled,
            Err(reason) => reason,
        };
        if reason == StopReason::MaxDuration {
            info!("Playback auto-stopped after {:?}", self.max_duration);
        }
        self.report.stop_reason = reason;
        self.release_all();

        info!(
            "Playback finished or stopped: {} passes, {} transitions, {} unmapped, {} failed",
            self.report.passes, self.report.transitions, self.report.unmapped, self.report.failures
        );
        self.report
    }

    async fn play_passes(&mut self) -> Result<(), StopReason> {
        let recorded = Arc::clone(&self.recorded);
        loop {
            let mut skip_delay = self.options.ignore_start_delay;
            for snapshot in recorded.events() {
                self.check_interrupt()?;
                if !(skip_delay || self.options.instant) {
                    self.pause(self.options.event_delay(snapshot.elapsed_ms)).await?;
                }
                skip_delay = false;
                self.apply(snapshot)?;
            }
            self.report.passes += 1;

            if self.options.instant {
                tokio::task::yield_now().await;
            } else {
                debug!(
                    "Waiting {}ms before replaying the macro...",
                    self.options.delay_between_replays
                );
                self.pause(self.options.replay_delay()).await?;
            }
        }
    }

    fn apply(&mut self, snapshot: &KeyStateSnapshot) -> Result<(), StopReason> {
        for edge in transitions(&self.previous, &snapshot.key_state) {
            self.check_interrupt()?;
            self.drive(edge.key, edge.pressed);
            // Track per edge so a stop mid-snapshot still releases what was pressed
            self.previous.insert(edge.key.to_string(), edge.pressed);
        }
        self.previous = snapshot.key_state.clone();
        Ok(())
    }

    fn drive(&mut self, key: &str, pressed: bool) {
        if keymap::is_mouse(key) && !self.options.play_mouse {
            debug!("Skipping mouse transition for {}", key);
            return;
        }
        let Some(code) = keymap::resolve(key) else {
            self.report.unmapped += 1;
            return;
        };

        let result = match (code, pressed) {
            (NativeCode::Key(k), true) => self.simulator.press_key(k),
            (NativeCode::Key(k), false) => self.simulator.release_key(k),
            (NativeCode::Button(b), true) => self.simulator.press_button(b),
            (NativeCode::Button(b), false) => self.simulator.release_button(b),
        };

        match result {
            Ok(()) => {
                debug!("{} {}", if pressed { "Pressing" } else { "Releasing" }, key);
                self.report.transitions += 1;
            }
            Err(e) => {
                warn!("{}", e);
                self.report.failures += 1;
            }
        }
    }

    fn release_all(&mut self) {
        let held: Vec<String> = self
            .previous
            .iter()
            .filter(|(_, pressed)| **pressed)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &held {
            self.drive(key, false);
        }
        self.previous.clear();
        if !held.is_empty() {
            info!("Released all keys ({})", held.join(", "));
        }
    }

    fn check_interrupt(&self) -> Result<(), StopReason> {
        if self.cancel.is_cancelled() {
            return Err(StopReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(StopReason::MaxDuration),
            _ => Ok(()),
        }
    }

    async fn pause(&self, wait: Duration) -> Result<(), StopReason> {
        if wait.is_zero() {
            // Zero delays must still give the scheduler (and a stop request) a turn
            tokio::task::yield_now().await;
            return self.check_interrupt();
        }
        let deadline = self.deadline;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StopReason::Cancelled),
            _ = async {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            } => Err(StopReason::MaxDuration),
            _ = sleep(wait) => Ok(()),
        }
    }
}
