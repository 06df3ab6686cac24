//! Configuration management for obs-tally.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations. A corrupt file is never overwritten;
//! the app falls back to defaults and the user keeps their edits.

use crate::{
    AppError, AppResult,
    config::{ConnectionConfig, DisplayConfig, TimingConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use obs_tally_core::{DEFAULT_RECONNECT_INTERVAL, EngineSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

const TOTAL_FILE_NAME: &str = "total.toml";

/// Where a loaded [`Config`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from an existing file.
    File,
    /// No file existed; defaults were written.
    Created,
    /// The file could not be parsed; defaults are in use and the file is untouched.
    InvalidFile,
}

impl ConfigSource {
    /// Whether saving may replace the file on disk.
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::InvalidFile)
    }
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// obs-websocket connection.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Poll and reconnect cadence.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Tray display.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from `path`, reporting where the values came from.
    ///
    /// A missing file is created with defaults. A file that cannot be parsed
    /// is logged and left untouched, and defaults are used for this run.
    #[track_caller]
    #[instrument]
    pub fn load_with_source(path: &Path) -> AppResult<(Self, ConfigSource)> {
        if !path.exists() {
            info!(config_path = ?path, "No config found, creating default");
            let config = Config::default();
            config.save_to(path)?;
            return Ok((config, ConfigSource::Created));
        }

        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                info!(config_path = ?path, "Configuration loaded");
                Ok((config, ConfigSource::File))
            }
            Err(e) => {
                warn!(
                    config_path = ?path,
                    error = %e,
                    "Config file is invalid, using defaults (file left unchanged)"
                );
                Ok((Config::default(), ConfigSource::InvalidFile))
            }
        }
    }

    /// Save to `path` unless the file there could not be parsed.
    ///
    /// Returns whether the file was written. Saving over an invalid file
    /// would replace the user's edits with defaults.
    #[track_caller]
    pub fn save_if_writable(&self, path: &Path, source: ConfigSource) -> AppResult<bool> {
        if !source.is_writable() {
            warn!(config_path = ?path, "Config file is invalid, change kept for this run only");
            return Ok(false);
        }
        self.save_to(path)?;
        Ok(true)
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)?;
            debug!(config_dir = ?dir, "Created config directory");
        }

        let temp_path = path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Engine tuning derived from this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            connection: self.connection.to_settings(),
            poll_interval: self.timing.poll_interval(),
            reconnect_interval: if self.timing.reconnect_interval_ms == 0 {
                DEFAULT_RECONNECT_INTERVAL
            } else {
                self.timing.reconnect_interval()
            },
            auto_connect: self.connection.auto_connect,
            auto_reconnect: true,
        }
    }

    /// Path of `config.toml` in the platform config directory.
    #[track_caller]
    pub fn config_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Platform data directory holding the total and the logs.
    #[track_caller]
    pub fn data_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// File backing the persisted total.
    #[track_caller]
    pub fn total_store_path() -> AppResult<PathBuf> {
        Ok(Self::data_dir()?.join(TOTAL_FILE_NAME))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "obs-tally", "OBS-Tally").ok_or_else(|| AppError::ConfigError {
            reason: "Failed to get project directories".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
