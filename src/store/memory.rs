//! In-memory settings store

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::SettingsStore;
use crate::data::SettingsBlob;
use crate::error::StoreError;

/// Settings store that keeps the blob in memory
///
/// Used when no settings file is wanted and by tests, which can make
/// writes fail to exercise fail-soft persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<SettingsBlob>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new(blob: SettingsBlob) -> Self {
        Self {
            blob: Mutex::new(blob),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current blob
    pub async fn snapshot(&self) -> SettingsBlob {
        self.blob.lock().await.clone()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn read(&self) -> Result<SettingsBlob, StoreError> {
        Ok(self.blob.lock().await.clone())
    }

    async fn write(&self, blob: &SettingsBlob) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "writes disabled",
            )));
        }
        *self.blob.lock().await = blob.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
