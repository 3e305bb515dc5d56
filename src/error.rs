//! Error types at the component seams

use thiserror::Error;

/// Failure to subscribe to the global input hook
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Input hook failed to start: {0}")]
    Listen(String),

    #[error("Input hook thread is no longer running")]
    Stopped,
}

/// Failure of a single simulated key or button transition
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Failed to simulate {action}: {reason}")]
    Failed { action: String, reason: String },
}

/// Failure to read or write the settings blob
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings blob is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}
