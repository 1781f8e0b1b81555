//! Configuration persistence for dialsnap settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What happens once a number has been extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialMode {
    /// Navigate to the `tel:` URI after a short delay
    #[default]
    AutoDial,
    /// Only expose a dial link; the user follows it
    Link,
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialSnapConfig {
    /// Auto-dial or link-only behaviour after recognition
    pub dial_mode: DialMode,
    /// Replace the letter O (either case) with the digit 0 before matching
    pub substitute_letter_o: bool,
    /// Offer a retake button while cropping
    pub allow_retake: bool,
    /// Shortest run of digits, `*` and `#` accepted as a number
    pub min_token_len: usize,
    /// Delay between showing the status and handing the URI to the dialer
    pub auto_dial_delay_ms: u64,
    /// Tesseract language model
    pub ocr_language: String,
    /// Tesseract page segmentation mode
    pub ocr_psm: i32,
    /// Tesseract OCR engine mode
    pub ocr_oem: i32,
    /// Restrict recognized characters, e.g. "0123456789*#"
    pub ocr_char_whitelist: Option<String>,
    /// Stop the camera when the front-end is backgrounded
    pub release_camera_when_hidden: bool,
    /// JPEG quality for captured stills (1-100)
    pub jpeg_quality: u8,
    /// Port for `dialsnap serve`
    pub server_port: u16,
    /// Directory the static server serves from
    pub asset_dir: PathBuf,
    /// Program that opens `tel:` URIs
    pub dial_opener: String,
}

impl Default for DialSnapConfig {
    fn default() -> Self {
        Self {
            dial_mode: DialMode::AutoDial,
            substitute_letter_o: true,
            allow_retake: true,
            min_token_len: 5,
            auto_dial_delay_ms: 100,
            ocr_language: "eng".to_string(),
            // Single uniform block of text suits a cropped code
            ocr_psm: 6,
            ocr_oem: 3,
            ocr_char_whitelist: None,
            // Held in reserve; page hide still releases the camera
            release_camera_when_hidden: false,
            jpeg_quality: 90,
            server_port: 8000,
            asset_dir: PathBuf::from("web"),
            dial_opener: "xdg-open".to_string(),
        }
    }
}

impl DialSnapConfig {
    /// The earlier behaviour: dial link, no O/0 substitution, no retake
    pub fn link_only() -> Self {
        Self {
            dial_mode: DialMode::Link,
            substitute_letter_o: false,
            allow_retake: false,
            ..Self::default()
        }
    }

    pub fn auto_dial_delay(&self) -> Duration {
        Duration::from_millis(self.auto_dial_delay_ms)
    }

    /// Default location: `$XDG_CONFIG_HOME/dialsnap/config.json`
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("No configuration directory on this platform")?;
        Ok(dir.join("dialsnap").join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(path) => path,
            Err(err) => {
                log::warn!("Could not locate config, using defaults: {:?}", err);
                return Self::default();
            }
        };

        match Self::load_from(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                log::debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Read a config file; `Ok(None)` when it does not exist
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Malformed config file: {}", path.display()))?;
        Ok(Some(config))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = DialSnapConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = DialSnapConfig::link_only();
        config.server_port = 9123;
        config.ocr_char_whitelist = Some("0123456789*#".to_string());
        config.save_to(&path).unwrap();

        let loaded = DialSnapConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "dial_mode": "link", "min_token_len": 7 }"#).unwrap();

        let loaded = DialSnapConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(loaded.dial_mode, DialMode::Link);
        assert_eq!(loaded.min_token_len, 7);
        assert_eq!(loaded.ocr_language, "eng");
        assert_eq!(loaded.auto_dial_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(DialSnapConfig::load_from(&path).is_err());
    }
}
