//! Persisted border color
//!
//! The config file holds exactly one value, the border color:
//!
//! ```json
//! {"color": {"red": 0, "green": 120, "blue": 255}}
//! ```
//!
//! Loading never fails. Each channel that is missing, not an integer, or outside
//! 0-255 falls back to its default independently.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::color::Color;
use crate::constants::config;

/// On-disk shape used when saving
#[derive(Debug, Serialize)]
struct PersistedConfig {
    color: Color,
}

/// Lenient on-disk shape used when loading: channels are kept as raw JSON
/// values so one bad field does not discard the others
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    color: Option<RawColor>,
}

#[derive(Debug, Default, Deserialize)]
struct RawColor {
    #[serde(default)]
    red: Option<Value>,
    #[serde(default)]
    green: Option<Value>,
    #[serde(default)]
    blue: Option<Value>,
}

impl RawColor {
    fn resolve(&self) -> Color {
        let fallback = Color::default();
        Color {
            red: channel("red", self.red.as_ref(), fallback.red),
            green: channel("green", self.green.as_ref(), fallback.green),
            blue: channel("blue", self.blue.as_ref(), fallback.blue),
        }
    }
}

fn channel(name: &str, value: Option<&Value>, fallback: u8) -> u8 {
    match value {
        Some(v) => match v.as_u64().and_then(|n| u8::try_from(n).ok()) {
            Some(n) => n,
            None => {
                warn!(channel = name, value = %v, fallback, "Invalid color channel in config, using default");
                fallback
            }
        },
        None => {
            warn!(channel = name, fallback, "Color channel missing from config, using default");
            fallback
        }
    }
}

/// Loads and saves the border color at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$SCREEN_BORDER_CONFIG`, or `<config dir>/screen-border/config.json`
    pub fn from_env() -> Self {
        Self::new(Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        if let Some(path) = env::var_os(config::PATH_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted color, falling back to the default for anything unreadable
    pub fn load(&self) -> Color {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No config file found, using default color");
                return Color::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read config file, using default color");
                return Color::default();
            }
        };

        let raw = match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse config file, using default color");
                return Color::default();
            }
        };

        let color = match raw.color {
            Some(color) => color.resolve(),
            None => {
                warn!(path = %self.path.display(), "Config file has no color, using default");
                Color::default()
            }
        };
        debug!(path = %self.path.display(), %color, "Loaded config");
        color
    }

    pub fn save(&self, color: Color) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&PersistedConfig { color })
            .context("Failed to serialize config to JSON")?;
        fs::write(&self.path, contents)
            .context(format!("Failed to write config file to {}", self.path.display()))?;
        info!(path = %self.path.display(), %color, "Saved border color");
        Ok(())
    }
}
