//! Persistent application configuration model and defaults.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{error::PlayerError, selection::NewEntryTemplate};

const MIN_TICK_INTERVAL_MS: u64 = 50;

/// Root configuration persisted to `cuedeck.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Position polling and seek behavior.
    pub playback: PlaybackConfig,
    #[serde(default)]
    /// Startup playlist and Add placeholders.
    pub playlist: PlaylistConfig,
    #[serde(default)]
    /// Console presentation preferences.
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Seeks closer than this to the engine position are ignored.
    #[serde(default = "default_seek_threshold_secs")]
    pub seek_threshold_secs: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlaylistConfig {
    #[serde(default = "default_true")]
    pub seed_default_entries: bool,
    #[serde(default = "default_new_entry_uri")]
    pub new_entry_uri: String,
    #[serde(default = "default_new_entry_thumbnail")]
    pub new_entry_thumbnail: String,
    #[serde(default = "default_new_entry_duration")]
    pub new_entry_duration: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UiConfig {
    /// Icon files for the play/pause control. Unset means text-only.
    #[serde(default)]
    pub play_icon: Option<String>,
    #[serde(default)]
    pub pause_icon: Option<String>,
    #[serde(default = "default_true")]
    pub show_notices: bool,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            seek_threshold_secs: default_seek_threshold_secs(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            seed_default_entries: true,
            new_entry_uri: default_new_entry_uri(),
            new_entry_thumbnail: default_new_entry_thumbnail(),
            new_entry_duration: default_new_entry_duration(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            play_icon: None,
            pause_icon: None,
            show_notices: true,
        }
    }
}

impl PlaylistConfig {
    pub fn new_entry_template(&self) -> NewEntryTemplate {
        NewEntryTemplate {
            source_uri: self.new_entry_uri.clone(),
            thumbnail_uri: self.new_entry_thumbnail.clone(),
            duration_label: self.new_entry_duration.clone(),
        }
    }
}

impl Config {
    pub fn sanitized(mut self) -> Self {
        self.playback.tick_interval_ms = self.playback.tick_interval_ms.max(MIN_TICK_INTERVAL_MS);
        if !self.playback.seek_threshold_secs.is_finite() || self.playback.seek_threshold_secs < 0.0
        {
            self.playback.seek_threshold_secs = default_seek_threshold_secs();
        }
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_seek_threshold_secs() -> f64 {
    1.0
}

fn default_new_entry_uri() -> String {
    "Media/video1.mp4".to_string()
}

fn default_new_entry_thumbnail() -> String {
    "Thumbnails/video1.jpg".to_string()
}

fn default_new_entry_duration() -> String {
    "00:30".to_string()
}

pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cuedeck").join("cuedeck.toml"))
}

/// Reads the config file, creating it with defaults if it does not exist.
/// A file that fails to parse falls back to defaults.
pub fn load_or_create(path: &Path) -> Result<Config, PlayerError> {
    if !path.exists() {
        info!(
            "Config file not found. Creating default config. path={}",
            path.display()
        );
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let default_config = Config::default();
        let content =
            toml::to_string(&default_config).map_err(|e| PlayerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        return Ok(default_config);
    }

    let content = std::fs::read_to_string(path)?;
    let config = match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!(
                "Failed to parse config, using defaults. path={} error={}",
                path.display(),
                e
            );
            Config::default()
        }
    };
    Ok(config.sanitized())
}
