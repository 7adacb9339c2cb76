// =============================================================================
// Ticker Insight — daily-bar technical analysis engine
// =============================================================================
//
// Layers, innermost first:
//
//   types / indicators / signals / trade_setup   pure computation
//   engine                                       IndicatorEngine pipeline
//   quotes / runtime_config / app_state / api    I/O and the REST surface
// =============================================================================

pub mod api;
pub mod app_state;
pub mod engine;
pub mod engine_config;
pub mod error;
pub mod indicators;
pub mod quotes;
pub mod runtime_config;
pub mod signals;
pub mod trade_setup;
pub mod types;

pub use engine::{Analysis, IndicatorEngine};
pub use engine_config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use types::{PositionInput, PriceBar, PriceSeries, RawBar};
