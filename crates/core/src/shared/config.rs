use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::domain::camera::StreamRequest;
use crate::shared::constants::{
    CAPTURE_HEIGHT, CAPTURE_WIDTH, DEFAULT_API_BASE_URL, DETECT_INTERVAL_MS, JPEG_QUALITY,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Which landing detection result is allowed to replace the overlay.
///
/// The default keeps arrival order: when tick 1's response lands after
/// tick 2's, tick 1's boxes end up on screen. Choose `NewestCapture` to
/// keep tick 2's overlay in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPolicy {
    /// Every landing result is drawn; the last response to arrive wins.
    #[default]
    LastToLand,
    /// A result is drawn only if its frame was captured after the frame
    /// behind the overlay currently shown.
    NewestCapture,
}

/// Client-side settings shared by the CLI and the desktop panel.
///
/// Persisted as JSON; fields missing from the file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub capture_width: u32,
    pub capture_height: u32,
    pub detect_interval_ms: u64,
    pub jpeg_quality: u8,
    /// Per-request timeout. `None` waits for the backend indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub overlay_policy: OverlayPolicy,
    /// Explicit label font; otherwise the font is resolved from the asset cache.
    pub font_path: Option<PathBuf>,
    /// Capture device (e.g. `/dev/video1`); platform default when unset.
    pub camera_device: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            capture_width: CAPTURE_WIDTH,
            capture_height: CAPTURE_HEIGHT,
            detect_interval_ms: DETECT_INTERVAL_MS,
            jpeg_quality: JPEG_QUALITY,
            request_timeout_secs: None,
            overlay_policy: OverlayPolicy::default(),
            font_path: None,
            camera_device: None,
        }
    }
}

impl ClientConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("facewatch").join("settings.json"))
    }

    /// Loads the user's settings, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring settings file: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        if self.capture_width == 0 || self.capture_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "capture resolution must be non-zero, got {}x{}",
                self.capture_width, self.capture_height
            )));
        }
        if self.detect_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "detect_interval_ms must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    pub fn detect_interval(&self) -> Duration {
        Duration::from_millis(self.detect_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn stream_request(&self) -> StreamRequest {
        StreamRequest {
            width: self.capture_width,
            height: self.capture_height,
        }
    }
}
