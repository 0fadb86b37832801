//! Configuration module for the file manager.

use serde::Deserialize;
use std::path::Path;

use crate::{FilesError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins (empty = any origin, without credentials).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/files_manager.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Token store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis server.
    #[default]
    Redis,
    /// In-process map (single node only).
    Memory,
}

/// Token store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: CacheBackend,
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Seconds between background checks: Redis is pinged, the memory
    /// backend drops expired tokens.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

fn default_check_interval() -> u64 {
    5
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            url: default_redis_url(),
            check_interval_secs: default_check_interval(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Base directory for stored file contents.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
}

fn default_storage_path() -> String {
    std::env::temp_dir()
        .join("files_manager")
        .to_string_lossy()
        .into_owned()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
        }
    }
}

/// Job queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Queue name shared by producer and worker.
    #[serde(default = "default_queue_name")]
    pub name: String,
    /// Worker sleep between polls when the queue is empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Active jobs claimed longer ago than this are redelivered.
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_secs: u64,
}

fn default_queue_name() -> String {
    crate::queue::THUMBNAIL_QUEUE.to_string()
}

fn default_poll_interval() -> u64 {
    500
}

fn default_stall_timeout() -> u64 {
    30
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            poll_interval_ms: default_poll_interval(),
            stall_timeout_secs: default_stall_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for log files. Each process writes `<dir>/<process>.log`.
    /// Empty disables file logging.
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token store configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// File storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Job queue configuration.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FilesError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file if it exists, then apply
    /// environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FilesError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `HOST`, `PORT`: HTTP bind address
    /// - `FOLDER_PATH`: base storage directory (blank is ignored)
    /// - `DB_PATH`: SQLite database file
    /// - `REDIS_URL`: token store URL
    /// - `LOG_LEVEL`: log level
    /// - `LOG_DIR`: log directory
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(host) = non_blank("HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_blank("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(folder) = non_blank("FOLDER_PATH") {
            self.files.storage_path = folder;
        }
        if let Some(db_path) = non_blank("DB_PATH") {
            self.database.path = db_path;
        }
        if let Some(url) = non_blank("REDIS_URL") {
            self.cache.url = url;
        }
        if let Some(level) = non_blank("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = non_blank("LOG_DIR") {
            self.logging.dir = dir;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.queue.name.trim().is_empty() {
            return Err(FilesError::Config("queue name must not be empty".to_string()));
        }
        if self.files.storage_path.trim().is_empty() {
            return Err(FilesError::Config(
                "files.storage_path must not be empty".to_string(),
            ));
        }
        if self.cache.check_interval_secs == 0 {
            return Err(FilesError::Config(
                "cache.check_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
