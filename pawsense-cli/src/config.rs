//! CLI configuration
//!
//! Loaded from `config.toml` in the platform config directory, with
//! `PAWSENSE_*` environment variables taking precedence. The same
//! directory holds the persisted assessment context.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use directories::ProjectDirs;
use serde::Deserialize;

/// Backend used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONFIG_FILE: &str = "config.toml";

/// On-disk shape; everything optional so partial files work.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    base_url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct PawsenseConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub config_dir: PathBuf,
}

impl PawsenseConfig {
    /// Load file config and apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_dir = Self::config_dir();
        let mut raw = RawConfig::default();

        let path = config_dir.join(CONFIG_FILE);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            raw = toml::from_str(&contents)?;
        }

        if let Ok(url) = std::env::var("PAWSENSE_BASE_URL") {
            raw.base_url = Some(url);
        }
        if let Ok(token) = std::env::var("PAWSENSE_TOKEN") {
            raw.token = Some(token);
        }
        if let Ok(secs) = std::env::var("PAWSENSE_TIMEOUT_SECS")
            && let Ok(secs) = secs.parse()
        {
            raw.timeout_secs = Some(secs);
        }

        Ok(Self {
            base_url: raw.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: raw.token,
            timeout: Duration::from_secs(raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            config_dir,
        })
    }

    /// Platform config directory.
    /// Can be overridden with PAWSENSE_CONFIG_DIR (useful for tests).
    pub fn config_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("PAWSENSE_CONFIG_DIR") {
            return PathBuf::from(dir);
        }
        ProjectDirs::from("", "", "pawsense")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".pawsense"))
    }
}
