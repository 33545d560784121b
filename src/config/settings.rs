//! User settings and preferences
//!
//! Manages application settings stored in ~/.sherlock/config.toml

use crate::config::ConnectionConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::export::OutputFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Rows per data page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound on pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_max_size: u32,

    /// Cells wider than this are truncated in table output
    #[serde(default = "default_cell_width")]
    pub max_cell_width: usize,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_page_size() -> u32 {
    50
}

fn default_query_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_pool_size() -> u32 {
    4
}

fn default_cell_width() -> usize {
    40
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            query_timeout_secs: default_query_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            pool_max_size: default_pool_size(),
            max_cell_width: default_cell_width(),
            default_format: OutputFormat::default(),
        }
    }
}

impl Settings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Reject values that would make every call fail or the pool panic
    pub fn validate(&self) -> ConfigResult<()> {
        let zero = [
            ("page_size", self.page_size == 0),
            ("pool_max_size", self.pool_max_size == 0),
            ("query_timeout_secs", self.query_timeout_secs == 0),
            ("connect_timeout_secs", self.connect_timeout_secs == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((field, _)) => Err(ConfigError::Invalid(format!("{} must be > 0", field))),
            None => Ok(()),
        }
    }
}

fn parse_settings(content: &str) -> ConfigResult<Settings> {
    let settings: Settings = toml::from_str(content)?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from config file
pub fn load_settings() -> ConfigResult<Settings> {
    let path = ConnectionConfig::config_dir()?.join("config.toml");
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| ConfigError::NotFound(format!("Failed to read config file: {}", e)))?;
    parse_settings(&content)
}
