//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ApiConfig;
use crate::demo::DemoConfig;
use crate::hub::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub hub: HubSection,

    #[serde(default)]
    pub demo: DemoSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5003
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Chat hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubSection {
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

fn default_id_prefix() -> String {
    "ChatUser".to_string()
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
        }
    }
}

/// Demo service timings. Missing keys fall back to [`DemoConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoSection {
    pub server_id: Option<u32>,
    pub unary_delay_ms: Option<u64>,
    pub stream_message_count: Option<u32>,
    pub stream_interval_ms: Option<u64>,
    pub client_stream_delay_ms: Option<u64>,
    pub bidi_delay_ms: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("chathub").join("config.toml")),
            Some(PathBuf::from("./chathub.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("CHATHUB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("CHATHUB_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid CHATHUB_PORT"),
            }
        }

        if let Some(prefix) = var("CHATHUB_ID_PREFIX") {
            self.hub.id_prefix = prefix;
        }

        if let Some(level) = var("CHATHUB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("CHATHUB_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.server.host.clone(), self.server.port)
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            id_prefix: self.hub.id_prefix.clone(),
        }
    }

    pub fn demo_config(&self) -> DemoConfig {
        let defaults = DemoConfig::default();
        let demo = &self.demo;
        DemoConfig {
            server_id: demo.server_id.unwrap_or(defaults.server_id),
            unary_delay_ms: demo.unary_delay_ms.unwrap_or(defaults.unary_delay_ms),
            stream_message_count: demo
                .stream_message_count
                .unwrap_or(defaults.stream_message_count),
            stream_interval_ms: demo.stream_interval_ms.unwrap_or(defaults.stream_interval_ms),
            client_stream_delay_ms: demo
                .client_stream_delay_ms
                .unwrap_or(defaults.client_stream_delay_ms),
            bidi_delay_ms: demo.bidi_delay_ms.unwrap_or(defaults.bidi_delay_ms),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Chat Hub Configuration
#
# Environment variables override these settings:
# - CHATHUB_HOST
# - CHATHUB_PORT
# - CHATHUB_ID_PREFIX
# - CHATHUB_LOG_LEVEL
# - CHATHUB_LOG_FORMAT

[server]
# Address to listen on
host = "127.0.0.1"
port = 5003

[hub]
# Peers are named {id_prefix}-1, {id_prefix}-2, ...
id_prefix = "ChatUser"

[demo]
# Identifier reported in demo responses
server_id = 1001

# Simulated work per unary call (ms)
unary_delay_ms = 100

# Server streaming: message count and pause between messages (ms)
stream_message_count = 5
stream_interval_ms = 1000

# Simulated work per client-stream item (ms)
client_stream_delay_ms = 200

# Pause after each bidirectional echo (ms)
bidi_delay_ms = 500

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG wins when set)
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
