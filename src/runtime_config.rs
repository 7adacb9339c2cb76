// =============================================================================
// Runtime Configuration — service settings with atomic save
// =============================================================================
//
// Everything the server needs beyond the engine itself: bind address, quote
// source, default share count, and the `EngineConfig` handed to every
// `IndicatorEngine` it builds.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine_config::EngineConfig;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_range() -> String {
    "1mo".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_shares() -> u32 {
    10
}

// =============================================================================
// QuoteSourceConfig
// =============================================================================

/// Where daily quotes are fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSourceConfig {
    /// Chart API host, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Look-back window requested from the source.
    #[serde(default = "default_range")]
    pub range: String,

    /// Bar interval requested from the source.
    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QuoteSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            range: default_range(),
            interval: default_interval(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the REST API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub quote_source: QuoteSourceConfig,

    /// Share count used when a request does not supply one.
    #[serde(default = "default_shares")]
    pub default_shares: u32,

    /// Periods, thresholds and rule weights of the indicator engine.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            quote_source: QuoteSourceConfig::default(),
            default_shares: default_shares(),
            engine: EngineConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .engine
            .validate()
            .with_context(|| format!("invalid engine section in {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            range = %config.quote_source.range,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
