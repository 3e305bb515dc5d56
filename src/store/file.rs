//! JSON file backed settings store

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::SettingsStore;
use crate::data::SettingsBlob;
use crate::error::StoreError;

/// Stores the settings blob as a JSON file
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn read(&self) -> Result<SettingsBlob, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {:?}, using defaults", self.path);
                Ok(SettingsBlob::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, blob: &SettingsBlob) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_vec_pretty(blob)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, contents).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}
