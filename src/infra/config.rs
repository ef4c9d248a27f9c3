use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::infra::runtime::limits::DEFAULT_TIMEOUT;

pub const CONFIG_PATH_ENV: &str = "LEANTIME_MCP_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid MODE: {0}. Must be 'server' or 'stdio'")]
    InvalidMode(String),
    #[error("PORT cannot be 0")]
    ZeroPort,
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("cannot read config file {path}: {reason}")]
    File { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mode: String, // "server" or "stdio"
    pub host: String,
    pub port: u16,
    pub leantime_url: Option<String>,
    pub leantime_key: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: "server".into(),
            host: "0.0.0.0".into(),
            port: 9000,
            leantime_url: None,
            leantime_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Optional TOML layer; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub leantime: LeantimeSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerSection {
    pub mode: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeantimeSection {
    pub url: Option<String>,
    pub key: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_err = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| file_err(e.to_string()))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Environment only. Unparseable numbers fall back to defaults.
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// TOML file named by `LEANTIME_MCP_CONFIG` (if set), then environment on top.
    pub fn from_env_and_toml() -> Result<Self, ConfigError> {
        let base = match non_empty_env(CONFIG_PATH_ENV) {
            Some(path) => Self::default().overlay_file(FileConfig::load(path)?),
            None => Self::default(),
        };
        Ok(base.overlay_env())
    }

    pub fn overlay_file(mut self, file: FileConfig) -> Self {
        if let Some(mode) = file.server.mode {
            self.mode = mode;
        }
        if let Some(host) = file.server.host {
            self.host = host;
        }
        if let Some(port) = file.server.port {
            self.port = port;
        }
        self.leantime_url = file.leantime.url.or(self.leantime_url);
        self.leantime_key = file.leantime.key.or(self.leantime_key);
        if let Some(ms) = file.leantime.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        self
    }

    fn overlay_env(mut self) -> Self {
        if let Some(mode) = non_empty_env("MODE") {
            self.mode = mode;
        }
        if let Some(host) = non_empty_env("HOST") {
            self.host = host;
        }
        if let Some(port) = non_empty_env("PORT").and_then(|s| s.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(url) = non_empty_env("LEANTIME_URL") {
            self.leantime_url = Some(url);
        }
        if let Some(key) = non_empty_env("LEANTIME_KEY") {
            self.leantime_key = Some(key);
        }
        if let Some(ms) = non_empty_env("LEANTIME_TIMEOUT_MS").and_then(|s| s.parse::<u64>().ok()) {
            self.timeout = Duration::from_millis(ms);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            return Err(ConfigError::InvalidMode(self.mode.clone()));
        }
        if self.mode == "server" && self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        self.leantime()?;
        Ok(())
    }

    /// Base URL and API key, both required to talk to Leantime.
    pub fn leantime(&self) -> Result<(&str, &str), ConfigError> {
        let url = self
            .leantime_url
            .as_deref()
            .ok_or(ConfigError::Missing("LEANTIME_URL"))?;
        let key = self
            .leantime_key
            .as_deref()
            .ok_or(ConfigError::Missing("LEANTIME_KEY"))?;
        Ok((url, key))
    }

    /// API key with everything but a short prefix hidden, for status output.
    pub fn masked_key(&self) -> String {
        match self.leantime_key.as_deref() {
            Some(k) => format!("{}***", k.chars().take(4).collect::<String>()),
            None => "Not configured".into(),
        }
    }
}
