//! # Engine Configuration
//!
//! YAML-based configuration for Synheart processes:
//!
//! - Stream defaults handed to the transport layer (bind address, WebSocket
//!   path, tick pacing)
//! - Scenario directory resolution
//! - Logging configuration
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `SYNHEART_CONFIG` environment variable
//! 2. `./synheart.yaml` (current directory)
//! 3. `~/.config/synheart/config.yaml` (user config)
//! 4. `/etc/synheart/config.yaml` (system config)
//!
//! Missing files fall back to defaults, so a bare checkout works without
//! any setup.
//!
//! ## Example Configuration
//!
//! ```yaml
//! stream:
//!   host: "127.0.0.1"
//!   port: 8787
//!   tick_interval_ms: 100
//!
//! scenarios:
//!   dir: "./scenarios"
//!
//! logging:
//!   level: debug
//!   format: compact
//! ```

use crate::observe::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Error type for configuration operations.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Defaults the streaming transport advertises to clients.
///
/// The engine never binds a socket itself; these values exist so the
/// transport, the doctor command, and documentation all agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Host the transport binds to
    pub host: String,
    /// Port the transport binds to
    pub port: u16,
    /// WebSocket endpoint path
    pub ws_path: String,
    /// Session tick pacing in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            ws_path: "/hsi".to_string(),
            tick_interval_ms: 100,
        }
    }
}

impl StreamConfig {
    /// WebSocket URL clients connect to.
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.ws_path)
    }
}

/// Where scenario definition files come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSource {
    /// Directory of YAML scenario files (None = search default locations)
    pub dir: Option<PathBuf>,
    /// Also register the scenarios compiled into the engine
    pub include_builtin: bool,
}

impl Default for ScenarioSource {
    fn default() -> Self {
        Self {
            dir: None,
            include_builtin: true,
        }
    }
}

/// Complete Synheart configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stream defaults for the transport layer
    pub stream: StreamConfig,
    /// Scenario file sources
    pub scenarios: ScenarioSource,
    /// Logging configuration
    pub logging: LogConfig,
}

impl EngineConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns defaults if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("SYNHEART_CONFIG") {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./synheart.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "synheart") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/synheart/config.yaml"));
        paths
    }

    /// Resolve the scenario directory.
    ///
    /// Order: `SYNHEART_SCENARIOS` environment variable, then the configured
    /// directory, then `./scenarios`.
    pub fn scenario_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("SYNHEART_SCENARIOS") {
            return PathBuf::from(dir);
        }
        self.scenarios
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("./scenarios"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "stream.tick_interval_ms must be > 0".to_string(),
            ));
        }
        if self.stream.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "stream.host must not be empty".to_string(),
            ));
        }
        if !self.stream.ws_path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "stream.ws_path must start with '/'".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}
