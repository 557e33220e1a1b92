//! Service configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `~/.config/planning-ics/config.toml`. Every section is optional:
//!
//! ```toml
//! horizon_months = 6
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 3000
//! route = "/jr.ics"
//!
//! [source]
//! url = "https://intranet.radiologie-lyon.com/fichiers/document/2577_planning_medecins.htm"
//! timeout_secs = 30
//! max_attempts = 3
//!
//! [pipeline]
//! zone = "Europe/Paris"
//! output_mode = "local-with-zone-id"
//! marker = "JR"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use planning_core::PipelineConfig;
use planning_source::{DEFAULT_PLANNING_URL, HttpSourceConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Path of the health endpoint; the feed route may not shadow it.
pub const HEALTH_ROUTE: &str = "/health";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ListenSettings,

    pub source: SourceSettings,

    pub pipeline: PipelineConfig,

    /// Only publish shifts from today through this many months ahead.
    pub horizon_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenSettings {
    pub bind: String,

    /// Overridden by the `PORT` environment variable.
    pub port: u16,

    /// Path serving the feed.
    pub route: String,
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            route: "/jr.ics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub url: String,

    pub timeout_secs: u64,

    pub max_attempts: u32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_PLANNING_URL.to_string(),
            timeout_secs: HttpSourceConfig::DEFAULT_TIMEOUT_SECS,
            max_attempts: RetryPolicy::default().max_attempts,
        }
    }
}

impl ServerConfig {
    /// Loads the default config file, falling back to defaults if it does not exist.
    pub fn load() -> ServerResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ServerError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("planning-ics")
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> ServerResult<()> {
        let route = &self.server.route;
        if !route.starts_with('/') {
            return Err(ServerError::config(format!(
                "server.route must start with '/': {}",
                route
            )));
        }
        if route.contains(['{', '}', '*']) {
            return Err(ServerError::config(format!(
                "server.route must be a literal path: {}",
                route
            )));
        }
        if route.split('/').any(|segment| segment.starts_with(':')) {
            return Err(ServerError::config(format!(
                "server.route segments cannot start with ':': {}",
                route
            )));
        }
        if route == HEALTH_ROUTE {
            return Err(ServerError::config(format!(
                "server.route conflicts with {}",
                HEALTH_ROUTE
            )));
        }
        if self.source.timeout_secs == 0 {
            return Err(ServerError::config("source.timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Applies the `PORT` environment variable, if set.
    pub fn apply_port_env(&mut self, value: Option<&str>) -> ServerResult<()> {
        if let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.server.port = raw
                .parse()
                .map_err(|_| ServerError::config(format!("invalid PORT value: {}", raw)))?;
        }
        Ok(())
    }

    /// Address the listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    pub fn http_source_config(&self) -> ServerResult<HttpSourceConfig> {
        let config = HttpSourceConfig::new(&self.source.url).map_err(|e| {
            ServerError::config(format!("invalid source.url {}: {}", self.source.url, e))
        })?;
        Ok(config
            .with_timeout(Duration::from_secs(self.source.timeout_secs))
            .with_retry(RetryPolicy::default().with_max_attempts(self.source.max_attempts)))
    }
}
