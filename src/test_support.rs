//! Test doubles for the input hook and the simulation backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use rdev::{Button, Key};
use tokio::time::Instant;

use crate::data::{KeyState, KeyStateSnapshot, Macro};
use crate::error::{HookError, SimulationError};
use crate::input::{InputHandler, InputHook, RawInput, Simulator, SubscriptionId};

/// Input hook driven by the test instead of the OS
#[derive(Default)]
pub struct ManualHook {
    handlers: Mutex<HashMap<SubscriptionId, InputHandler>>,
    next_id: AtomicU64,
    refuse: AtomicBool,
}

impl ManualHook {
    /// A hook whose subscribe always fails
    pub fn refusing() -> Self {
        let hook = Self::default();
        hook.refuse.store(true, Ordering::SeqCst);
        hook
    }

    /// Deliver one notification to every subscriber
    pub fn emit(&self, key: &str, pressed: bool) {
        let handlers = self.handlers.lock().unwrap();
        for handler in handlers.values() {
            handler(RawInput::new(key, pressed));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

impl InputHook for ManualHook {
    fn subscribe(&self, handler: InputHandler) -> Result<SubscriptionId, HookError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(HookError::Listen("permission denied".to_string()));
        }
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.handlers.lock().unwrap().insert(id, handler);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers.lock().unwrap().remove(&id);
    }
}

/// One call made against the simulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCall {
    PressKey(Key),
    ReleaseKey(Key),
    PressButton(Button),
    ReleaseButton(Button),
}

/// Simulator that records calls with the (possibly paused) tokio clock
pub struct RecordingSimulator {
    calls: Mutex<Vec<(SimCall, Instant)>>,
    failing_key: Option<Key>,
}

impl RecordingSimulator {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_key: None,
        }
    }

    /// Every call involving `key` fails
    pub fn failing_on(key: Key) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_key: Some(key),
        }
    }

    pub fn calls(&self) -> Vec<SimCall> {
        self.calls.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    /// Calls with their offset from `start` in milliseconds
    pub fn timed_calls(&self, start: Instant) -> Vec<(SimCall, u64)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(c, at)| (*c, at.duration_since(start).as_millis() as u64))
            .collect()
    }

    fn record(&self, call: SimCall) -> Result<(), SimulationError> {
        let fails = matches!(
            (call, self.failing_key),
            (SimCall::PressKey(k), Some(f)) | (SimCall::ReleaseKey(k), Some(f)) if k == f
        );
        if fails {
            return Err(SimulationError::Failed {
                action: format!("{:?}", call),
                reason: "backend unavailable".to_string(),
            });
        }
        self.calls.lock().unwrap().push((call, Instant::now()));
        Ok(())
    }
}

impl Simulator for RecordingSimulator {
    fn press_key(&self, key: Key) -> Result<(), SimulationError> {
        self.record(SimCall::PressKey(key))
    }

    fn release_key(&self, key: Key) -> Result<(), SimulationError> {
        self.record(SimCall::ReleaseKey(key))
    }

    fn press_button(&self, button: Button) -> Result<(), SimulationError> {
        self.record(SimCall::PressButton(button))
    }

    fn release_button(&self, button: Button) -> Result<(), SimulationError> {
        self.record(SimCall::ReleaseButton(button))
    }
}

/// Build a snapshot from `(key, pressed)` pairs
pub fn snapshot(entries: &[(&str, bool)], elapsed_ms: u64) -> KeyStateSnapshot {
    let key_state: KeyState = entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    KeyStateSnapshot::new(key_state, elapsed_ms)
}

/// Build a macro from snapshots
pub fn macro_of(id: &str, events: Vec<KeyStateSnapshot>) -> Macro {
    Macro::new(id, events)
}
