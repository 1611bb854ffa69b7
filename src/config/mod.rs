//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::editor::EDITOR_STEP_UNITS;
use crate::util::time::TICK_REPEAT_MS;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Bridge binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Shared secret the game server presents on `/bridge`
    pub bridge_token: String,

    /// Directory holding `<map>.json` zone files
    pub mapdata_path: PathBuf,
    /// Period of the repeat tick that redraws editor beams
    pub tick_repeat_interval: Duration,
    /// Grid step editor corners snap to
    pub editor_step_units: f32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR when the host assigns one
        let server_addr = match lookup("PORT") {
            Some(port) => format!("127.0.0.1:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:27080".to_string()),
        };

        let tick_repeat_ms = match lookup("TICK_REPEAT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid("TICK_REPEAT_MS"))?,
            None => TICK_REPEAT_MS,
        };

        let editor_step_units = match lookup("EDITOR_STEP_UNITS") {
            Some(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|step| step.is_finite() && *step > 0.0)
                .ok_or(ConfigError::Invalid("EDITOR_STEP_UNITS"))?,
            None => EDITOR_STEP_UNITS,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::Invalid("SERVER_ADDR"))?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            bridge_token: lookup("BRIDGE_TOKEN")
                .filter(|token| !token.is_empty())
                .ok_or(ConfigError::Missing("BRIDGE_TOKEN"))?,

            mapdata_path: lookup("MAPDATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("mapdata/limit_zones")),
            tick_repeat_interval: Duration::from_millis(tick_repeat_ms),
            editor_step_units,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
