//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub live: LiveConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub datastore: DatastoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Read endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8082".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Push channel configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveConfig {
    /// Websocket URL. Derived from `api.base_url` when unset.
    pub url: Option<String>,
}

/// Dev backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// JSON file with the posts served by `GET /posts`
    pub fixture: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            fixture: None,
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Document store bootstrap configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreConfig {
    /// Environment variable holding the connection string
    #[serde(default = "default_uri_env")]
    pub uri_env: String,

    #[serde(default = "default_app_name")]
    pub app_name: String,
}

fn default_uri_env() -> String {
    "MONGODB_URI".to_string()
}

fn default_app_name() -> String {
    "postwall".to_string()
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            uri_env: default_uri_env(),
            app_name: default_app_name(),
        }
    }
}

impl DatastoreConfig {
    /// Read the connection string from the environment
    pub fn uri(&self) -> Option<String> {
        std::env::var(&self.uri_env).ok().filter(|s| !s.is_empty())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

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

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
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
            dirs::config_dir().map(|p| p.join("postwall").join("config.toml")),
            Some(PathBuf::from("./postwall.toml")),
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

    /// Websocket URL of the push channel
    pub fn live_url(&self) -> String {
        match &self.live.url {
            Some(url) => url.clone(),
            None => {
                let base = self
                    .api
                    .base_url
                    .trim_end_matches('/')
                    .replacen("https://", "wss://", 1)
                    .replacen("http://", "ws://", 1);
                format!("{}/ws", base)
            }
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("POSTWALL_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(url) = std::env::var("POSTWALL_LIVE_URL") {
            self.live.url = Some(url);
        }

        if let Ok(host) = std::env::var("POSTWALL_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("POSTWALL_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(fixture) = std::env::var("POSTWALL_FIXTURE") {
            self.server.fixture = Some(fixture);
        }

        if let Ok(level) = std::env::var("POSTWALL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("POSTWALL_LOG_FORMAT") {
            self.logging.format = format;
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
    r#"# Postwall Configuration
#
# Environment variables override these settings:
# - POSTWALL_API_URL
# - POSTWALL_LIVE_URL
# - POSTWALL_HOST
# - POSTWALL_PORT
# - POSTWALL_FIXTURE
# - POSTWALL_LOG_LEVEL
# - POSTWALL_LOG_FORMAT

[api]
# Base URL of the backend serving GET /posts
base_url = "http://localhost:8082"

[live]
# Push channel websocket URL (default: base_url with ws scheme + /ws)
# url = "ws://localhost:8082/ws"

[server]
# Dev backend host
host = "0.0.0.0"

# Dev backend port
port = 8082

# Posts served by the dev backend
# fixture = "posts.json"

[datastore]
# Environment variable holding the MongoDB connection string
uri_env = "MONGODB_URI"

# Application name reported to the server
app_name = "postwall"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8082");
        assert_eq!(config.server.addr(), "0.0.0.0:8082");
        assert_eq!(config.datastore.uri_env, "MONGODB_URI");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_live_url_derived_from_base() {
        let mut config = Config::default();
        config.api.base_url = "https://feed.example.com/".to_string();
        assert_eq!(config.live_url(), "wss://feed.example.com/ws");

        config.live.url = Some("ws://elsewhere/live".to_string());
        assert_eq!(config.live_url(), "ws://elsewhere/live");
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8082");
        assert_eq!(config.server.port, 8082);
        assert!(config.live.url.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://10.0.0.5:9000\"\n\n[server]\nport = 9000").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbroken").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));

        let missing = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
