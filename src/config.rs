use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-image configuration for exiv-bridge.
///
/// Controls how metadata write-back touches the underlying file. In-memory
/// images ignore the file-related settings.
///
/// # Loading
///
/// ```rust,no_run
/// use exiv_bridge::config::Config;
///
/// // From a JSON file
/// let config = Config::load("bridge.json".as_ref()).unwrap();
///
/// // Or from a JSON string; missing fields take their defaults
/// let config = Config::from_json(r#"{ "write": { "backup_originals": true } }"#).unwrap();
/// assert!(config.write.atomic);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Write-back behavior.
    pub write: WriteConfig,
}

/// Controls how `write_metadata` persists a file-backed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// If `true`, copy the file to `<name>.<ext>.bak` before the first write-back.
    pub backup_originals: bool,
    /// If `true`, write to a temporary file in the same directory and rename it over
    /// the original. A failed write then leaves the original untouched.
    pub atomic: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            backup_originals: false,
            atomic: true,
        }
    }
}

impl Config {
    /// Parse a config from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json).context("Failed to parse config")?;
        Ok(config)
    }

    /// Load config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&contents)?;
        log::debug!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Save config to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
