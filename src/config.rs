//! Configuration: file locations and persisted sequence settings
//!
//! Paths follow the priority
//! CLI `--config-dir` → `FLIPBOOK_CONFIG_DIR` → local `flipbook.json` → platform dir.
//!
//! Settings live in `flipbook.json`; every field is optional and falls back
//! to its default, so partial files are fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::cursor::DEFAULT_FRAME_RATE;
use crate::entities::FilterMode;

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "flipbook.json";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "FLIPBOOK_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Create PathConfig from CLI arguments and environment variables
    ///
    /// Priority: CLI args → ENV var (FLIPBOOK_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));

        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Platform paths:
/// - Linux: ~/.config/flipbook/{name}
/// - macOS: ~/Library/Application Support/flipbook/{name}
/// - Windows: %APPDATA%\flipbook\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Get the configuration directory
fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    // Local settings file wins over the platform directory
    if let Ok(current_dir) = std::env::current_dir() {
        if current_dir.join(SETTINGS_FILE).exists() {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("flipbook");
    }

    PathBuf::from(".")
}

/// Loading and playback settings applied to an `ImageSequence` before load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    /// Frames per second used by time addressing
    pub frame_rate: f64,
    /// Resolve and decode folder loads on a background thread
    pub threaded: bool,
    /// Cap on frames listed from a folder, 0 = unlimited
    pub max_frames: usize,
    /// Only list files with this extension
    pub extension: Option<String>,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    /// Pause between background decodes, in milliseconds
    pub yield_ms: u64,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            threaded: false,
            max_frames: 0,
            extension: None,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            yield_ms: 5,
        }
    }
}

impl SequenceSettings {
    /// Load settings from JSON, falling back to defaults when the file is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;

        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        Ok(())
    }

    pub fn yield_interval(&self) -> Duration {
        Duration::from_millis(self.yield_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };

        let path = config_file("test.json", &config);
        assert_eq!(path, PathBuf::from("/custom/test.json"));
    }

    #[test]
    fn test_cli_dir_beats_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from/cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn test_missing_settings_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SequenceSettings::load(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, SequenceSettings::default());
        assert_eq!(settings.yield_interval(), Duration::from_millis(5));
    }

    #[test]
    fn test_partial_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{ "frame_rate": 24.0, "mag_filter": "nearest" }"#).unwrap();

        let settings = SequenceSettings::load(&path).unwrap();
        assert_eq!(settings.frame_rate, 24.0);
        assert_eq!(settings.mag_filter, FilterMode::Nearest);
        assert_eq!(settings.min_filter, FilterMode::Linear);
        assert!(!settings.threaded);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = SequenceSettings {
            threaded: true,
            max_frames: 12,
            extension: Some("exr".into()),
            ..Default::default()
        };

        settings.save(&path).unwrap();
        assert_eq!(SequenceSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(SequenceSettings::load(&path).is_err());
    }
}
