//! Settings blob persistence

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::data::SettingsBlob;
use crate::error::StoreError;

/// Persistent home of the settings blob
///
/// Every read returns the latest committed blob; every write replaces it.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn read(&self) -> Result<SettingsBlob, StoreError>;
    async fn write(&self, blob: &SettingsBlob) -> Result<(), StoreError>;
}
