// =============================================================================
// Central Application State
// =============================================================================
//
// Shared across all request handlers via `Arc<AppState>`.
//
// Thread safety:
//   - parking_lot::RwLock around the runtime config (engine section is
//     replaceable at runtime through the API).
//   - A separate Mutex serialises config replacement: validate, save, then
//     install.  Readers keep the old config until the save has succeeded.
//   - Atomic counter for served analyses.
//   - Every request builds its own `IndicatorEngine` from a config snapshot,
//     so concurrent analyses never share mutable state.
// =============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::engine::IndicatorEngine;
use crate::engine_config::EngineConfig;
use crate::error::EngineResult;
use crate::quotes::QuoteClient;
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub runtime_config: RwLock<RuntimeConfig>,
    pub quote_client: QuoteClient,
    /// Where config changes are persisted; `None` keeps them in memory only.
    pub config_path: Option<PathBuf>,
    config_writes: Mutex<()>,
    analyses_served: AtomicU64,
}

impl AppState {
    pub fn new(config: RuntimeConfig, config_path: Option<PathBuf>) -> Result<Self> {
        let quote_client = QuoteClient::new(config.quote_source.clone())
            .context("failed to create quote client")?;
        Ok(Self {
            runtime_config: RwLock::new(config),
            quote_client,
            config_path,
            config_writes: Mutex::new(()),
            analyses_served: AtomicU64::new(0),
        })
    }

    /// Build an engine from the current engine config.
    pub fn engine(&self) -> EngineResult<IndicatorEngine> {
        let config = self.runtime_config.read().engine.clone();
        IndicatorEngine::new(config)
    }

    pub fn engine_config(&self) -> EngineConfig {
        self.runtime_config.read().engine.clone()
    }

    pub fn default_shares(&self) -> u32 {
        self.runtime_config.read().default_shares
    }

    /// Validate, persist (when a config path is set) and install a new
    /// engine config.  Nothing changes if validation or the save fails.
    pub fn replace_engine_config(&self, engine: EngineConfig) -> Result<()> {
        engine.validate().context("rejected engine config")?;

        let _writer = self.config_writes.lock();
        let mut candidate = self.runtime_config.read().clone();
        candidate.engine = engine;

        if let Some(path) = &self.config_path {
            candidate.save(path)?;
        }
        *self.runtime_config.write() = candidate;
        info!("engine config replaced");
        Ok(())
    }

    pub fn record_analysis(&self) -> u64 {
        self.analyses_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn analyses_served(&self) -> u64 {
        self.analyses_served.load(Ordering::Relaxed)
    }
}
