use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WaymarkConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub facts: FactsConfig,
    pub atlas: AtlasConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FactsConfig {
    /// Ceiling on a serialized payload, in bytes.
    pub max_payload_bytes: usize,
    /// Upper bound for caller-supplied TTLs; the lower bound is fixed at 60.
    pub max_ttl_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AtlasConfig {
    /// Fold radius used when `capture_frame` attaches an Atlas Frame.
    pub default_fold_radius: i64,
}

impl Default for WaymarkConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            facts: FactsConfig::default(),
            atlas: AtlasConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8431,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_waymark_dir()
            .join("waymark.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 262_144,
            max_ttl_seconds: 2_592_000, // 30 days
        }
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            default_fold_radius: 1,
        }
    }
}

/// Returns `~/.waymark/`
pub fn default_waymark_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".waymark")
}

/// Returns the default config file path: `~/.waymark/config.toml`
pub fn default_config_path() -> PathBuf {
    default_waymark_dir().join("config.toml")
}

impl WaymarkConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            WaymarkConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (WAYMARK_DB, WAYMARK_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("WAYMARK_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("WAYMARK_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Fact store limits derived from config.
    pub fn fact_limits(&self) -> crate::store::facts::FactLimits {
        crate::store::facts::FactLimits {
            max_payload_bytes: self.facts.max_payload_bytes,
            max_ttl_seconds: self.facts.max_ttl_seconds,
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
