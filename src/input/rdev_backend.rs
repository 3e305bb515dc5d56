//! rdev-based input hook and simulator
//! Works on Windows, macOS, and Linux (X11)

use crate::error::{HookError, SimulationError};
use crate::input::keymap::{button_name, key_name};
use crate::input::{InputHandler, InputHook, RawInput, Simulator, SubscriptionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

/// rdev reports setup failures by returning from `listen`; a listener still
/// running after this long is considered installed.
const LISTEN_STARTUP_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
enum ListenerState {
    NotStarted,
    Running,
    Failed(String),
}

struct HookShared {
    handlers: Mutex<HashMap<SubscriptionId, InputHandler>>,
    state: Mutex<ListenerState>,
    next_id: AtomicU64,
}

impl HookShared {
    fn handlers(&self) -> MutexGuard<'_, HashMap<SubscriptionId, InputHandler>> {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn state(&self) -> MutexGuard<'_, ListenerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dispatch(&self, input: RawInput) {
        // Handlers run under the lock so unsubscribe is a hard cut-off
        let handlers = self.handlers();
        for handler in handlers.values() {
            handler(input.clone());
        }
    }
}

/// Global input hook backed by a single `rdev::listen` thread
///
/// rdev can only listen once per process and never returns while
/// listening, so the thread is started on first subscribe and lives until
/// exit. Subscribers are added to and removed from a dispatch table.
pub struct RdevHook {
    shared: Arc<HookShared>,
}

impl RdevHook {
    /// Create a new rdev hook (the listener starts on first subscribe)
    pub fn new() -> Self {
        Self {
            shared: Arc::new(HookShared {
                handlers: Mutex::new(HashMap::new()),
                state: Mutex::new(ListenerState::NotStarted),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    fn ensure_listening(&self) -> Result<(), HookError> {
        let mut state = self.shared.state();
        match &*state {
            ListenerState::Running => return Ok(()),
            ListenerState::Failed(reason) => return Err(HookError::Listen(reason.clone())),
            ListenerState::NotStarted => {}
        }

        let (err_tx, err_rx) = mpsc::channel::<String>();
        let shared = self.shared.clone();

        thread::spawn(move || {
            // Key translation must go through the main queue on macOS, or
            // TISGetInputSourceProperty fails dispatch_assert_queue
            rdev::set_is_main_thread(false);

            info!("rdev input capture started");

            let dispatch_shared = shared.clone();
            let callback = move |event: rdev::Event| {
                let input = match event.event_type {
                    rdev::EventType::KeyPress(key) => RawInput::new(key_name(key), true),
                    rdev::EventType::KeyRelease(key) => RawInput::new(key_name(key), false),
                    rdev::EventType::ButtonPress(button) => {
                        RawInput::new(button_name(button), true)
                    }
                    rdev::EventType::ButtonRelease(button) => {
                        RawInput::new(button_name(button), false)
                    }
                    rdev::EventType::MouseMove { .. } | rdev::EventType::Wheel { .. } => return,
                };
                dispatch_shared.dispatch(input);
            };

            let reason = match rdev::listen(callback) {
                Ok(()) => "listener exited".to_string(),
                Err(e) => {
                    error!("rdev listen error: {:?}", e);
                    format!("{:?}", e)
                }
            };
            // Report before touching state: subscribe holds the state lock while waiting
            if err_tx.send(reason.clone()).is_err() {
                debug!("rdev listener exit reported after startup");
            }
            *shared.state() = ListenerState::Failed(reason);

            info!("rdev input capture stopped");
        });

        match err_rx.recv_timeout(LISTEN_STARTUP_GRACE) {
            Ok(reason) => {
                *state = ListenerState::Failed(reason.clone());
                Err(HookError::Listen(reason))
            }
            Err(RecvTimeoutError::Timeout) => {
                *state = ListenerState::Running;
                Ok(())
            }
            Err(RecvTimeoutError::Disconnected) => {
                *state = ListenerState::Failed("listener thread exited".to_string());
                Err(HookError::Stopped)
            }
        }
    }
}

impl Default for RdevHook {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHook for RdevHook {
    fn subscribe(&self, handler: InputHandler) -> Result<SubscriptionId, HookError> {
        self.ensure_listening()?;
        let id = SubscriptionId::new(self.shared.next_id.fetch_add(1, Ordering::SeqCst));
        self.shared.handlers().insert(id, handler);
        debug!("Input hook subscriber {:?} added", id);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.shared.handlers().remove(&id).is_some() {
            debug!("Input hook subscriber {:?} removed", id);
        }
    }
}

/// Input simulator backed by `rdev::simulate`
pub struct RdevSimulator;

impl RdevSimulator {
    pub fn new() -> Self {
        Self
    }

    fn send(&self, event: rdev::EventType) -> Result<(), SimulationError> {
        rdev::simulate(&event).map_err(|e| SimulationError::Failed {
            action: format!("{:?}", event),
            reason: format!("{:?}", e),
        })
    }
}

impl Default for RdevSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for RdevSimulator {
    fn press_key(&self, key: rdev::Key) -> Result<(), SimulationError> {
        self.send(rdev::EventType::KeyPress(key))
    }

    fn release_key(&self, key: rdev::Key) -> Result<(), SimulationError> {
        self.send(rdev::EventType::KeyRelease(key))
    }

    fn press_button(&self, button: rdev::Button) -> Result<(), SimulationError> {
        self.send(rdev::EventType::ButtonPress(button))
    }

    fn release_button(&self, button: rdev::Button) -> Result<(), SimulationError> {
        self.send(rdev::EventType::ButtonRelease(button))
    }
}
