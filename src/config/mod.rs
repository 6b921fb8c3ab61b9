use crate::subscription::OverflowPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorldSyncConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub subscribers: SubscriberConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Listener and static file settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Directory served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_cors_permissive() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            static_dir: default_static_dir(),
            cors_permissive: default_cors_permissive(),
        }
    }
}

/// Per-subscriber outbound queue settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriberConfig {
    /// Maximum pending messages per subscriber; unbounded when absent
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    /// Only consulted when `queue_capacity` is set
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

/// HTTP API limits
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_max_body_bytes() -> usize {
    1_048_576 // 1 MB
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl WorldSyncConfig {
    /// Load from `WORLDSYNC_CONFIG` if set, otherwise defaults; then apply env overrides
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("WORLDSYNC_CONFIG") {
            Ok(path) => load_config(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables win over file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WORLDSYNC_BIND") {
            self.server.bind_addr = v;
        }
        if let Ok(v) = std::env::var("WORLDSYNC_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("WORLDSYNC_QUEUE_CAPACITY") {
            if let Ok(n) = v.parse::<usize>() {
                self.subscribers.queue_capacity = Some(n);
            }
        }
        if let Ok(v) = std::env::var("WORLDSYNC_MAX_BODY_BYTES") {
            if let Ok(n) = v.parse::<usize>() {
                self.api.max_body_bytes = n;
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<WorldSyncConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
    let config: WorldSyncConfig =
        toml::from_str(&contents).with_context(|| format!("Invalid config {}", path))?;
    Ok(config)
}
