/// Photo booth configuration
///
/// Read from a TOML file; every key is optional and falls back to the
/// defaults below. A missing file is not an error.
///
/// ```toml
/// share_base_url = "https://booth.example"
/// max_page_size = 50
/// countdown_ticks = 5
/// ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::camera::{DEFAULT_COUNTDOWN_INTERVAL, DEFAULT_COUNTDOWN_TICKS};
use crate::error::{PhotoboothError, Result};
use crate::render::DEFAULT_OVERLAY_FONT_SIZE;
use crate::share::{
    ShareConfig, DEFAULT_PAGE_SIZE, DEFAULT_QR_SIZE, DEFAULT_SHARE_BASE_URL, MAX_PAGE_SIZE,
};
use crate::state::library::Library;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite file; the platform data directory when unset
    pub database_path: Option<PathBuf>,
    pub share_base_url: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub overlay_font_size: u32,
    pub countdown_ticks: u32,
    pub countdown_interval_ms: u64,
    pub qr_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            overlay_font_size: DEFAULT_OVERLAY_FONT_SIZE,
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            countdown_interval_ms: DEFAULT_COUNTDOWN_INTERVAL.as_millis() as u64,
            qr_size: DEFAULT_QR_SIZE,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults if the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_toml(&contents)
                    .map_err(|e| PhotoboothError::Config(format!("{}: {}", path.display(), e)))?;
                debug!(path = %path.display(), "config loaded");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Default config location: `<config dir>/photobooth/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photobooth")
            .join("config.toml")
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| PhotoboothError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PhotoboothError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            return Err(PhotoboothError::Config("max_page_size must be at least 1".into()));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(PhotoboothError::Config(format!(
                "default_page_size must be between 1 and {}",
                self.max_page_size
            )));
        }
        if self.overlay_font_size == 0 || self.qr_size == 0 {
            return Err(PhotoboothError::Config(
                "overlay_font_size and qr_size must be positive".into(),
            ));
        }
        if self.share_base_url.trim().is_empty() {
            return Err(PhotoboothError::Config("share_base_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(Library::default_path)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    pub fn share(&self) -> ShareConfig {
        ShareConfig {
            base_url: self.share_base_url.clone(),
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            qr_size: self.qr_size,
        }
    }
}
