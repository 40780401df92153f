//! Configuration management
//!
//! Stored as TOML in the platform config directory
//! (`~/.config/golfhelper/config.toml` on Linux).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_DIR_NAME: &str = "golfhelper";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Which date names the session folder a clip is filed under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SessionDate {
    /// The day the tool runs
    #[default]
    Today,
    /// The day the source video was recorded
    Capture,
}

/// Golfhelper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Library root holding the dated session folders
    pub root: PathBuf,

    /// Clips larger than this are downscaled
    #[serde(default = "default_max_video_size_mb")]
    pub max_video_size_mb: u64,

    /// Explicit ffmpeg binary, otherwise looked up on PATH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub session_date: SessionDate,
}

fn default_max_video_size_mb() -> u64 { 5 }

impl Default for Config {
    fn default() -> Self {
        Self {
            root: dirs::video_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Golf"),
            max_video_size_mb: default_max_video_size_mb(),
            ffmpeg_path: None,
            session_date: SessionDate::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!(
                "config not found at {:?} - have you run 'golfhelper setup'?",
                path
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {:?}", path))
    }

    /// Write configuration, creating the parent directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                info!("config directory not found, creating {:?}", parent);
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create config directory {:?}", parent))?;
            }
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file {:?}", path))
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.max_video_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn ffmpeg_binary(&self) -> PathBuf {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"))
    }
}

/// Default config file location
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .context("could not determine the platform config directory")
}

/// Resolve `--config` or fall back to the default location
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand_tilde(path)),
        None => default_config_path(),
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Ok(rest) = path.strip_prefix("~") else {
        return path;
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path,
    }
}
