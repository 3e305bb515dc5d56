//! Configuration management for macro-deck

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::input::keymap;
use crate::player::PlayerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Trigger keys for the record and play actions
    #[serde(default)]
    pub hotkeys: HotkeyConfig,

    /// Where the settings blob lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// Host-side playback settings
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Key name that toggles recording
    #[serde(default = "default_record_key")]
    pub record: String,

    /// Key name that toggles playback
    #[serde(default = "default_play_key")]
    pub play: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Settings file; defaults to macros.json in the data directory
    pub settings_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Stop playback automatically after this many milliseconds
    pub max_duration_ms: Option<u64>,

    /// Macro to play instead of the most recent one
    pub macro_id: Option<String>,
}

fn default_record_key() -> String {
    "F9".to_string()
}

fn default_play_key() -> String {
    "F10".to_string()
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            record: default_record_key(),
            play: default_play_key(),
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load configuration from `config_path`, writing defaults there if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path.to_path_buf());
            Ok(config)
        } else {
            let config = Config {
                config_path: Some(config_path.to_path_buf()),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_config_path(),
        }
    }

    fn project_dirs() -> Result<directories::ProjectDirs> {
        directories::ProjectDirs::from("dev", "macro-deck", "macro-deck")
            .context("Failed to determine config directory")
    }

    /// Get default config path
    fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path of the settings blob
    pub fn settings_path(&self) -> Result<PathBuf> {
        match &self.storage.settings_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("macros.json")),
        }
    }

    /// Record hotkey in the form captured events carry
    pub fn record_hotkey(&self) -> String {
        canonical_hotkey(&self.hotkeys.record)
    }

    /// Play hotkey in the form captured events carry
    pub fn play_hotkey(&self) -> String {
        canonical_hotkey(&self.hotkeys.play)
    }

    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            max_duration: self.playback.max_duration_ms.map(Duration::from_millis),
            macro_id: self.playback.macro_id.clone(),
        }
    }
}

fn canonical_hotkey(name: &str) -> String {
    let name = name.trim();
    keymap::canonical_name(name).unwrap_or_else(|| {
        warn!("Hotkey {:?} matches no known key and will never trigger", name);
        name.to_uppercase()
    })
}
