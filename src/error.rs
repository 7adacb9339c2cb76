// =============================================================================
// Engine Errors
// =============================================================================
//
// The engine never performs I/O, so the taxonomy is small:
//
//   MalformedInput       a required OHLCV field is missing / invalid, or the
//                        series is empty.  Fails fast, no partial score.
//   InsufficientHistory  not enough bars for the longest warm-up window.
//                        Raised by `IndicatorFrame::finalize` and absorbed by
//                        the engine into the neutral result.
//   UndefinedLatest      enough bars, but an indicator of the latest bar is
//                        undefined (e.g. RSI under the `undefined` zero-loss
//                        policy).  Absorbed the same way.
//   InvalidConfig        an `EngineConfig` that cannot produce indicators.
//
// Non-finite arithmetic is not an error: calculators normalise it to an
// undefined marker at the point of computation.
// =============================================================================

use thiserror::Error;

/// Unified error type for the indicator engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("insufficient history: {have} usable bars, {need} required")]
    InsufficientHistory { have: usize, need: usize },

    #[error("latest bar has an undefined indicator: {valid_rows} of {bars} rows fully defined")]
    UndefinedLatest { bars: usize, valid_rows: usize },

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Errors the engine turns into the neutral result instead of failing.
    pub fn is_unscoreable(&self) -> bool {
        matches!(self, Self::InsufficientHistory { .. } | Self::UndefinedLatest { .. })
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
