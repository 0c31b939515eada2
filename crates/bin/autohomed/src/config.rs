//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `autohome.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Device backend selection and credentials.
    pub backend: BackendConfig,
    /// Pipeline timing knobs.
    pub pipeline: PipelineConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Which device backend to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// In-memory simulated home.
    Mock,
    /// A real Home Assistant instance over REST.
    HomeAssistant,
}

/// Device backend configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Home Assistant base URL; only read when `kind = "home_assistant"`.
    pub base_url: String,
    /// Home Assistant long-lived access token.
    pub token: String,
}

/// Pipeline timing configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Debounce quiet period for value changes, in milliseconds.
    pub quiet_period_ms: u64,
    /// Upper bound on one device backend call, in milliseconds.
    pub call_timeout_ms: u64,
    /// Event bus channel capacity.
    pub event_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `autohome.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("autohome.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AUTOHOME_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("AUTOHOME_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("AUTOHOME_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("AUTOHOME_BACKEND") {
            match val.as_str() {
                "mock" => self.backend.kind = BackendKind::Mock,
                "home_assistant" => self.backend.kind = BackendKind::HomeAssistant,
                _ => {}
            }
        }
        if let Ok(val) = std::env::var("AUTOHOME_HASS_URL") {
            self.backend.base_url = val;
        }
        if let Ok(val) = std::env::var("AUTOHOME_HASS_TOKEN") {
            self.backend.token = val;
        }
        if let Ok(val) = std::env::var("AUTOHOME_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.backend.kind == BackendKind::HomeAssistant && self.backend.token.is_empty() {
            return Err(ConfigError::Validation(
                "the home_assistant backend needs a token".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Debounce quiet period as a [`Duration`].
    #[must_use]
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.pipeline.quiet_period_ms)
    }

    /// Backend call timeout as a [`Duration`].
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.pipeline.call_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Mock,
            base_url: "http://homeassistant.local:8123".to_string(),
            token: String::new(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 800,
            call_timeout_ms: 10_000,
            event_capacity: 256,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "autohomed=info,autohome=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
