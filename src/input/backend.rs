//! Input hook and simulation backend traits

use crate::error::{HookError, SimulationError};
use std::sync::Arc;

/// One raw down/up notification from the global hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    /// Canonical key identifier (see [`crate::input::keymap`])
    pub key: String,
    /// `true` for down, `false` for up
    pub pressed: bool,
}

impl RawInput {
    pub fn new(key: impl Into<String>, pressed: bool) -> Self {
        Self {
            key: key.into(),
            pressed,
        }
    }
}

/// Callback invoked on the hook's delivery thread
pub type InputHandler = Box<dyn Fn(RawInput) + Send + Sync>;

/// Handle returned by [`InputHook::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Source of global low-level input notifications
///
/// Delivers one callback per physical transition, in order. No timestamps
/// are provided; subscribers stamp their own receipt time.
pub trait InputHook: Send + Sync {
    /// Register a handler. Fails if the underlying hook cannot be installed.
    fn subscribe(&self, handler: InputHandler) -> Result<SubscriptionId, HookError>;

    /// Remove a handler. Once this returns the handler is never invoked again.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Synthetic input injection
///
/// Every call is independent; a failure affects only that transition.
pub trait Simulator: Send + Sync {
    fn press_key(&self, key: rdev::Key) -> Result<(), SimulationError>;
    fn release_key(&self, key: rdev::Key) -> Result<(), SimulationError>;
    fn press_button(&self, button: rdev::Button) -> Result<(), SimulationError>;
    fn release_button(&self, button: rdev::Button) -> Result<(), SimulationError>;
}

/// Create the input hook for the current platform
pub fn create_input_hook() -> Arc<dyn InputHook> {
    tracing::info!("Using rdev backend for input capture");
    Arc::new(super::rdev_backend::RdevHook::new())
}

/// Create the input simulator for the current platform
pub fn create_simulator() -> Arc<dyn Simulator> {
    tracing::info!("Using rdev backend for input simulation");
    Arc::new(super::rdev_backend::RdevSimulator::new())
}
