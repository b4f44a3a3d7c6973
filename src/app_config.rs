use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

// Application configuration module
// This module handles loading, overriding and validating the viewer settings.

/// Environment variable selecting the backend base URL
pub const BACKEND_URL_ENV: &str = "HISTOMAP_BACKEND_URL";

/// Environment variable pointing at a configuration file
pub const CONFIG_PATH_ENV: &str = "HISTOMAP_CONFIG";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Base address of the events backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Maximum number of events per query
    #[serde(default = "default_query_limit")]
    pub query_limit: u32,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Map viewport
    #[serde(default)]
    pub map: MapConfig,

    /// Period of headless media timestamp ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Length of every headless narration; unbounded when absent
    #[serde(default)]
    pub narration_secs: Option<u64>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Initial map viewport
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapConfig {
    // @field: Center latitude
    #[serde(default = "default_center_latitude")]
    pub center_latitude: f64,

    // @field: Center longitude
    #[serde(default = "default_center_longitude")]
    pub center_longitude: f64,

    // @field: Zoom level
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_latitude: default_center_latitude(),
            center_longitude: default_center_longitude(),
            zoom: default_zoom(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_query_limit() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tick_interval_ms() -> u64 {
    250 // roughly the rate browsers fire timeupdate at
}

fn default_center_latitude() -> f64 {
    48.8566
}

fn default_center_longitude() -> f64 {
    2.3522
}

fn default_zoom() -> u8 {
    12
}

impl Config {
    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("histomap").join("config.json"))
    }

    /// Defaults, then the config file if one exists, then the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_backend_override(std::env::var(BACKEND_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replace the backend URL with a non-empty override
    pub fn apply_backend_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.backend_url = url;
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend_url)
            .map_err(|e| anyhow!("Invalid backend URL '{}': {}", self.backend_url, e))?;

        if self.query_limit == 0 {
            return Err(anyhow!("Query limit must be greater than zero"));
        }
        if self.tick_interval_ms == 0 {
            return Err(anyhow!("Tick interval must be greater than zero"));
        }
        if self.narration_secs == Some(0) {
            return Err(anyhow!("Narration length must be greater than zero"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn narration_length(&self) -> Option<Duration> {
        self.narration_secs.map(Duration::from_secs)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: default_backend_url(),
            query_limit: default_query_limit(),
            timeout_secs: default_timeout_secs(),
            map: MapConfig::default(),
            tick_interval_ms: default_tick_interval_ms(),
            narration_secs: None,
            log_level: LogLevel::default(),
        }
    }
}
