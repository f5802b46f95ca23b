use std::path::PathBuf;

use visitlog::{load_config, Config};

use crate::error::ApiError;

pub const CONFIG_PATH_ENV: &str = "VISITLOG_CONFIG";
pub const LOG_FILTER_ENV: &str = "VISITLOG_LOG";
pub const DEFAULT_CONFIG_PATH: &str = "visitlog.json";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Process-level settings read from the environment. Everything else lives
/// in the JSON config file.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub config_path: PathBuf,
    pub log_filter: String,
    pub json_logs: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let config_path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let log_filter = std::env::var(LOG_FILTER_ENV)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let json_logs = std::env::var("VISITLOG_LOG_JSON")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            config_path: PathBuf::from(config_path),
            log_filter,
            json_logs,
        }
    }

    pub fn load(&self) -> Result<Config, ApiError> {
        load_config(&self.config_path).map_err(|e| ApiError::Config(e.to_string()))
    }
}
