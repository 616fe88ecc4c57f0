//! Configuration for kvgate
//!
//! Sources are layered, later ones winning:
//! built-in defaults, an optional TOML file, `KVGATE_*` environment
//! variables, and finally `REDIS_HOST`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::{Error, Result};

/// Conventional Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default config file, looked up relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "kvgate.toml";

/// Environment variable naming an alternate config file
pub const CONFIG_PATH_ENV: &str = "KVGATE_CONFIG";

/// Environment variable naming the store host
pub const REDIS_HOST_ENV: &str = "REDIS_HOST";

/// Process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store hostname or address
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Store port
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Bind address for HTTP
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Directory holding `*.html` templates
    #[serde(default = "default_views_dir")]
    pub views_dir: PathBuf,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub pool: PoolSettings,
}

/// Connection pool settings as they appear in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Idle connections retained
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    /// Idle connections older than this are closed (0 disables)
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_redis_host() -> String {
    "localhost".to_string()
}
fn default_redis_port() -> u16 {
    DEFAULT_REDIS_PORT
}
fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}
fn default_views_dir() -> PathBuf {
    PathBuf::from("views")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_idle() -> usize {
    3
}
fn default_idle_timeout_secs() -> u64 {
    240
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_idle: default_max_idle(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl PoolSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            bind_addr: default_bind_addr(),
            views_dir: default_views_dir(),
            log_level: default_log_level(),
            pool: PoolSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path, std::env::var(REDIS_HOST_ENV).ok())
    }

    /// Load configuration from `path` (optional) with an explicit `REDIS_HOST` value.
    ///
    /// An empty host is treated the same as an unset one.
    pub fn load_from(path: &Path, redis_host: Option<String>) -> Result<Self> {
        let redis_host = redis_host.filter(|h| !h.trim().is_empty());

        let config: Config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("KVGATE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("redis_host", redis_host)?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.redis_host.trim().is_empty() {
            return Err(Error::InvalidConfig("redis_host must not be empty".into()));
        }
        if self.redis_port == 0 {
            return Err(Error::InvalidConfig("redis_port must not be 0".into()));
        }
        Ok(())
    }

    /// Connection URL for the store
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.redis_host, self.redis_port)
    }
}
