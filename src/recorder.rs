//! Macro recorder
//!
//! While recording, every raw down/up notification from the global input
//! hook becomes a [`KeyStateSnapshot`] carrying the full current key state
//! and the time since the previous snapshot. The growing buffer is
//! persisted after each event (failures are logged, recording continues).
//! Stopping seals the buffer into a new [`Macro`] in the settings store.
//!
//! The hook callback only stamps the receipt time and forwards the event;
//! the buffer is owned and mutated by the session task alone. Stop
//! unsubscribes before the task drains the channel and hands the buffer
//! back, so no callback can race the final read.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::data::{KeyState, KeyStateSnapshot, Macro, SettingsBlob};
use crate::error::HookError;
use crate::input::{InputHook, RawInput, SubscriptionId};
use crate::store::SettingsStore;

/// Result of a recorder request, surfaced to the user as a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Not recording
    Idle,
    /// Recording started (or was already running)
    Started,
    /// Recording stopped and sealed into a macro
    Saved(Macro),
    /// Recording stopped without any captured events
    NoEvents,
}

impl RecordOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RecordOutcome::Idle => "Record",
            RecordOutcome::Started => "Recording...",
            RecordOutcome::Saved(_) => "Saved Macro",
            RecordOutcome::NoEvents => "No Events",
        }
    }
}

/// A raw notification with the instant it was received
#[derive(Debug)]
struct StampedInput {
    input: RawInput,
    at: Instant,
}

/// Mutable state of one recording session
struct RecordingSession {
    /// Settings blob; `current_recording` is the session buffer
    blob: SettingsBlob,
    /// Keys currently held down
    held: KeyState,
    last_timestamp: Instant,
}

impl RecordingSession {
    fn new(mut blob: SettingsBlob, started_at: Instant) -> Self {
        blob.is_recording = true;
        blob.current_recording.clear();
        Self {
            blob,
            held: KeyState::new(),
            last_timestamp: started_at,
        }
    }

    fn record(&mut self, stamped: StampedInput) {
        let elapsed_ms = stamped
            .at
            .saturating_duration_since(self.last_timestamp)
            .as_millis() as u64;
        self.last_timestamp = stamped.at;

        self.held.insert(stamped.input.key, stamped.input.pressed);
        let key_state = self.held.clone();
        self.held.retain(|_, pressed| *pressed);

        let event = KeyStateSnapshot::new(key_state, elapsed_ms);
        debug!("Recorded event: {:?}", event);
        self.blob.current_recording.push(event);
    }

    fn len(&self) -> usize {
        self.blob.current_recording.len()
    }
}

struct ActiveRecording {
    subscription: SubscriptionId,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<RecordingSession>,
}

/// Records global input into macros
pub struct Recorder {
    hook: Arc<dyn InputHook>,
    store: Arc<dyn SettingsStore>,
    /// Upper-cased identifiers that are never recorded
    ignored_keys: Arc<HashSet<String>>,
    active: Option<ActiveRecording>,
}

impl Recorder {
    /// Create a new idle recorder
    pub fn new(hook: Arc<dyn InputHook>, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            hook,
            store,
            ignored_keys: Arc::new(HashSet::new()),
            active: None,
        }
    }

    /// Never record these identifiers (e.g. the keys bound to record/play)
    pub fn with_ignored_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_keys = Arc::new(keys.into_iter().map(|k| k.as_ref().to_uppercase()).collect());
        self
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Primary action: start when idle, stop when recording
    pub async fn toggle(&mut self) -> Result<RecordOutcome, HookError> {
        if self.is_recording() {
            Ok(self.stop().await)
        } else {
            self.start().await
        }
    }

    /// Start a recording session
    ///
    /// Fails without creating any state if the input hook cannot be subscribed.
    pub async fn start(&mut self) -> Result<RecordOutcome, HookError> {
        if self.is_recording() {
            debug!("Recording already in progress");
            return Ok(RecordOutcome::Started);
        }

        let blob = match self.store.read().await {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to read settings, recording with defaults: {}", e);
                SettingsBlob::default()
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let ignored = self.ignored_keys.clone();
        let started_at = Instant::now();

        let subscription = self.hook.subscribe(Box::new(move |input: RawInput| {
            if ignored.contains(&input.key.to_uppercase()) {
                return;
            }
            let stamped = StampedInput {
                input,
                at: Instant::now(),
            };
            if let Err(e) = tx.send(stamped) {
                debug!("Recording session gone, dropping input: {:?}", e.0.input);
            }
        }))?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let session = RecordingSession::new(blob, started_at);
        let task = tokio::spawn(run_session(session, rx, stop_rx, self.store.clone()));

        self.active = Some(ActiveRecording {
            subscription,
            stop_tx,
            task,
        });

        info!("Started recording");
        Ok(RecordOutcome::Started)
    }

    /// Stop the session and seal its buffer into a macro
    pub async fn stop(&mut self) -> RecordOutcome {
        let Some(active) = self.active.take() else {
            debug!("Stop requested while not recording");
            return RecordOutcome::Idle;
        };

        self.hook.unsubscribe(active.subscription);
        if active.stop_tx.send(()).is_err() {
            debug!("Recording task already finished");
        }

        let session = match active.task.await {
            Ok(session) => session,
            Err(e) => {
                error!("Recording task failed: {}", e);
                self.clear_persisted_recording().await;
                return RecordOutcome::NoEvents;
            }
        };
        info!("Stopped recording after {} events", session.len());

        let mut blob = session.blob;
        blob.is_recording = false;
        let events = std::mem::take(&mut blob.current_recording);

        match Macro::seal(events) {
            Some(recorded) => {
                blob.macros.push(recorded.clone());
                persist(self.store.as_ref(), &blob).await;
                info!(
                    "Finished recording and saved macro {} ({} events, {} ms)",
                    recorded.id(),
                    recorded.events().len(),
                    recorded.duration_ms()
                );
                RecordOutcome::Saved(recorded)
            }
            None => {
                persist(self.store.as_ref(), &blob).await;
                warn!("No key events recorded.");
                RecordOutcome::NoEvents
            }
        }
    }

    /// Return to idle, discarding any session in progress
    pub async fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            self.hook.unsubscribe(active.subscription);
            active.task.abort();
            if let Err(e) = active.task.await {
                if !e.is_cancelled() {
                    error!("Recording task failed: {}", e);
                }
            }
            info!("Discarded recording in progress");
        }
        self.clear_persisted_recording().await;
    }

    async fn clear_persisted_recording(&self) {
        let mut blob = match self.store.read().await {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to read settings while resetting recorder: {}", e);
                return;
            }
        };
        if !blob.is_recording && blob.current_recording.is_empty() {
            return;
        }
        blob.is_recording = false;
        blob.current_recording.clear();
        persist(self.store.as_ref(), &blob).await;
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            self.hook.unsubscribe(active.subscription);
            active.task.abort();
        }
    }
}

async fn run_session(
    mut session: RecordingSession,
    mut rx: mpsc::UnboundedReceiver<StampedInput>,
    mut stop_rx: oneshot::Receiver<()>,
    store: Arc<dyn SettingsStore>,
) -> RecordingSession {
    persist(store.as_ref(), &session.blob).await;

    loop {
        tokio::select! {
            biased;
            Some(stamped) = rx.recv() => {
                session.record(stamped);
                persist(store.as_ref(), &session.blob).await;
            }
            _ = &mut stop_rx => break,
        }
    }

    // The hook is already unsubscribed; keep whatever was still queued
    rx.close();
    while let Some(stamped) = rx.recv().await {
        session.record(stamped);
    }
    session
}

async fn persist(store: &dyn SettingsStore, blob: &SettingsBlob) {
    if let Err(e) = store.write(blob).await {
        warn!("Failed to persist recording state: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::{snapshot, ManualHook};
    use std::time::Duration;

    fn recorder() -> (Recorder, Arc<ManualHook>, Arc<MemoryStore>) {
        let hook = Arc::new(ManualHook::default());
        let store = Arc::new(MemoryStore::default());
        let recorder = Recorder::new(hook.clone(), store.clone());
        (recorder, hook, store)
    }

    /// Let the session task catch up
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffer_integrity() {
        let (mut recorder, hook, store) = recorder();
        assert_eq!(recorder.start().await.unwrap(), RecordOutcome::Started);

        hook.emit("A", true);
        hook.emit("B", true);
        hook.emit("A", false);

        let RecordOutcome::Saved(recorded) = recorder.stop().await else {
            panic!("expected a saved macro");
        };
        assert_eq!(
            recorded.events(),
            &[
                snapshot(&[("A", true)], 0),
                snapshot(&[("A", true), ("B", true)], 0),
                snapshot(&[("A", false), ("B", true)], 0),
            ]
        );

        let blob = store.snapshot().await;
        assert_eq!(blob.macros, vec![recorded]);
        assert!(!blob.is_recording);
        assert!(blob.current_recording.is_empty());
        assert_eq!(hook.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_between_events() {
        let (mut recorder, hook, _store) = recorder();
        recorder.start().await.unwrap();

        tokio::time::advance(Duration::from_millis(30)).await;
        hook.emit("A", true);
        tokio::time::advance(Duration::from_millis(120)).await;
        hook.emit("A", false);

        let RecordOutcome::Saved(recorded) = recorder.stop().await else {
            panic!("expected a saved macro");
        };
        assert_eq!(
            recorded.events(),
            &[snapshot(&[("A", true)], 30), snapshot(&[("A", false)], 120)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_without_events() {
        let (mut recorder, _hook, store) = recorder();
        recorder.start().await.unwrap();
        assert_eq!(recorder.stop().await, RecordOutcome::NoEvents);

        let blob = store.snapshot().await;
        assert!(blob.macros.is_empty());
        assert!(!blob.is_recording);
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffer_persisted_incrementally() {
        let (mut recorder, hook, store) = recorder();
        recorder.start().await.unwrap();
        hook.emit("SPACE", true);
        settle().await;

        let blob = store.snapshot().await;
        assert!(blob.is_recording);
        assert_eq!(blob.current_recording, vec![snapshot(&[("SPACE", true)], 0)]);
        recorder.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_failure_does_not_stop_recording() {
        let (mut recorder, hook, store) = recorder();
        store.set_fail_writes(true);
        recorder.start().await.unwrap();

        hook.emit("A", true);
        settle().await;
        hook.emit("A", false);

        let outcome = recorder.stop().await;
        assert!(matches!(&outcome, RecordOutcome::Saved(m) if m.events().len() == 2));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_failure_creates_no_session() {
        let hook = Arc::new(ManualHook::refusing());
        let store = Arc::new(MemoryStore::default());
        let mut recorder = Recorder::new(hook, store.clone());

        assert!(recorder.start().await.is_err());
        assert!(!recorder.is_recording());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_keys_not_recorded() {
        let (recorder, hook, _store) = recorder();
        let mut recorder = recorder.with_ignored_keys(["f9"]);
        recorder.start().await.unwrap();

        hook.emit("F9", true);
        hook.emit("Q", true);
        hook.emit("F9", false);

        let RecordOutcome::Saved(recorded) = recorder.stop().await else {
            panic!("expected a saved macro");
        };
        assert_eq!(recorded.events(), &[snapshot(&[("Q", true)], 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_and_append() {
        let (mut recorder, hook, store) = recorder();

        for key in ["A", "B"] {
            assert_eq!(recorder.toggle().await.unwrap(), RecordOutcome::Started);
            hook.emit(key, true);
            hook.emit(key, false);
            assert!(matches!(recorder.toggle().await.unwrap(), RecordOutcome::Saved(_)));
        }

        let blob = store.snapshot().await;
        assert_eq!(blob.macros.len(), 2);
        assert_ne!(blob.macros[0].id(), blob.macros[1].id());
        assert_eq!(blob.latest_macro().unwrap().events()[0], snapshot(&[("B", true)], 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_session() {
        let (mut recorder, hook, store) = recorder();
        recorder.start().await.unwrap();
        hook.emit("A", true);
        settle().await;

        recorder.reset().await;
        assert!(!recorder.is_recording());
        assert_eq!(hook.subscriber_count(), 0);

        let blob = store.snapshot().await;
        assert!(!blob.is_recording);
        assert!(blob.current_recording.is_empty());
        assert!(blob.macros.is_empty());
        assert_eq!(recorder.stop().await, RecordOutcome::Idle);
    }
}
