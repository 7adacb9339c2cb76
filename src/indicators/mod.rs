// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free calculators.  Every calculator returns one value per
// input bar; warm-up-bounded ones (RSI, SMA) mark undefined bars with `None`
// so callers are forced to handle insufficient data explicitly.

pub mod ema;
pub mod frame;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;

pub use frame::{FinalizedFrame, IndicatorFrame, IndicatorRow};
pub use rsi::{RsiZeroLossPolicy, RsiZone};
