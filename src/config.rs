//! ==============================================================================
//! config.rs - Merge Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `merge.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - StorageConfig: where the history document lives.
//!     - SourceConfig: remote snapshot url, fetch timeout, record source tag.
//!     - RetentionConfig: how far back records are kept.
//!     - LoggingConfig: default log level when RUST_LOG is unset.
//!
//! ==============================================================================

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct MergeConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub tag: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetentionConfig {
    pub window_hours: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/root/.openclaw/workspace/memory/huinan-history.json"),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://raw.githubusercontent.com/Artistkisa/kisara-viz-center/main/ecs-data/huinan-data.json"
                .to_string(),
            timeout_seconds: 30,
            tag: "ecs".to_string(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { window_hours: 72 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl MergeConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: MergeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        Ok(config)
    }

    /// Load with default fallback
    ///
    /// Runs before logging is initialized, so problems go to stderr.
    pub fn load_or_default() -> Self {
        let paths = [
            PathBuf::from("config").join("merge.toml"),
            PathBuf::from("..").join("config").join("merge.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        eprintln!("[CONFIG] Warning: {:#}", e);
                    }
                }
            }
        }

        println!("[CONFIG] No config file found - using defaults");
        Self::default()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    pub fn retention_window(&self) -> time::Duration {
        time::Duration::hours(i64::from(self.retention.window_hours))
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│          MERGE CONFIGURATION            │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Store: {}", self.storage.path.display());
        println!("│ Source: {}", self.source.url);
        println!("│ Source Tag: {}", self.source.tag);
        println!("│ Fetch Timeout: {}s", self.source.timeout_seconds);
        println!("│ Retention: {}h", self.retention.window_hours);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
