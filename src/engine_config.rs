// =============================================================================
// Engine Configuration — immutable periods, thresholds and rule weights
// =============================================================================
//
// Passed into `IndicatorEngine::new` once and never mutated afterwards.  All
// fields carry `#[serde(default)]` so a partial JSON object (from the runtime
// config file or the REST API) fills in the stock values.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::indicators::rsi::RsiZeroLossPolicy;

/// Largest look-back window `validate` accepts for any indicator.
pub const MAX_PERIOD: usize = 1_000;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_rsi_period() -> usize {
    14
}

fn default_sma_short() -> usize {
    7
}

fn default_sma_long() -> usize {
    14
}

fn default_ema_span() -> usize {
    20
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_oversold() -> f64 {
    30.0
}

fn default_overbought() -> f64 {
    70.0
}

fn default_oversold_points() -> f64 {
    15.0
}

fn default_overbought_points() -> f64 {
    -10.0
}

fn default_ten() -> f64 {
    10.0
}

fn default_five() -> f64 {
    5.0
}

fn default_doji_body_pct() -> f64 {
    0.02
}

fn default_doji_range_multiple() -> f64 {
    3.0
}

fn default_wick_body_multiple() -> f64 {
    2.0
}

fn default_opposite_wick_pct() -> f64 {
    0.10
}

fn default_flat_body_pct() -> f64 {
    0.005
}

fn default_breakout_range_pct() -> f64 {
    0.02
}

fn default_stop_loss_pct() -> f64 {
    0.05
}

fn default_take_profit_pct() -> f64 {
    0.02
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Look-back windows for the indicator calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// Short SMA window (trend rule numerator).
    #[serde(default = "default_sma_short")]
    pub sma_short: usize,

    /// Long SMA window (trend rule baseline).
    #[serde(default = "default_sma_long")]
    pub sma_long: usize,

    /// Span of the standalone `EMA` column.
    #[serde(default = "default_ema_span")]
    pub ema_span: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// Behaviour when RSI's trailing average loss is zero.
    #[serde(default)]
    pub rsi_zero_loss: RsiZeroLossPolicy,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            sma_short: default_sma_short(),
            sma_long: default_sma_long(),
            ema_span: default_ema_span(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            rsi_zero_loss: RsiZeroLossPolicy::default(),
        }
    }
}

impl IndicatorParams {
    /// Minimum number of bars before every warm-up-bounded column is defined.
    ///
    /// RSI needs `period` changes (so `period + 1` bars); SMA needs `window`.
    pub fn warm_up_bars(&self) -> usize {
        self.rsi_period
            .saturating_add(1)
            .max(self.sma_short)
            .max(self.sma_long)
    }
}

// =============================================================================
// ScoringRules
// =============================================================================

/// Thresholds and point values of the additive composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    #[serde(default = "default_oversold")]
    pub rsi_oversold: f64,

    #[serde(default = "default_overbought")]
    pub rsi_overbought: f64,

    #[serde(default = "default_oversold_points")]
    pub oversold_points: f64,

    /// Usually negative.
    #[serde(default = "default_overbought_points")]
    pub overbought_points: f64,

    /// Short SMA above long SMA.
    #[serde(default = "default_ten")]
    pub trend_points: f64,

    /// MACD above its signal line.
    #[serde(default = "default_ten")]
    pub momentum_points: f64,

    #[serde(default = "default_five")]
    pub close_above_mean_points: f64,

    #[serde(default = "default_five")]
    pub obv_above_mean_points: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            rsi_oversold: default_oversold(),
            rsi_overbought: default_overbought(),
            oversold_points: default_oversold_points(),
            overbought_points: default_overbought_points(),
            trend_points: default_ten(),
            momentum_points: default_ten(),
            close_above_mean_points: default_five(),
            obv_above_mean_points: default_five(),
        }
    }
}

// =============================================================================
// PatternThresholds
// =============================================================================

/// Fractions used by the candlestick and day-trade classifiers.
///
/// Percentages are fractions of the latest close (0.02 = 2 %).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternThresholds {
    /// Doji: body below this fraction of close.
    #[serde(default = "default_doji_body_pct")]
    pub doji_body_pct: f64,

    /// Doji: range above this multiple of body.
    #[serde(default = "default_doji_range_multiple")]
    pub doji_range_multiple: f64,

    /// Shooting star / hammer: dominant wick above this multiple of body.
    #[serde(default = "default_wick_body_multiple")]
    pub wick_body_multiple: f64,

    /// Shooting star / hammer: opposite wick below this fraction of close.
    #[serde(default = "default_opposite_wick_pct")]
    pub opposite_wick_pct: f64,

    /// Breakout watch: body below this fraction of close.
    #[serde(default = "default_flat_body_pct")]
    pub flat_body_pct: f64,

    /// Breakout watch: range above this fraction of close.
    #[serde(default = "default_breakout_range_pct")]
    pub breakout_range_pct: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            doji_body_pct: default_doji_body_pct(),
            doji_range_multiple: default_doji_range_multiple(),
            wick_body_multiple: default_wick_body_multiple(),
            opposite_wick_pct: default_opposite_wick_pct(),
            flat_body_pct: default_flat_body_pct(),
            breakout_range_pct: default_breakout_range_pct(),
        }
    }
}

// =============================================================================
// TradeSetupParams
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSetupParams {
    /// Stop sits this fraction of close below the latest low.
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,

    /// Target sits this fraction of close above the latest close.
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,
}

impl Default for TradeSetupParams {
    fn default() -> Self {
        Self {
            stop_loss_pct: default_stop_loss_pct(),
            take_profit_pct: default_take_profit_pct(),
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Complete, immutable configuration of one `IndicatorEngine`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub scoring: ScoringRules,

    #[serde(default)]
    pub patterns: PatternThresholds,

    #[serde(default)]
    pub trade_setup: TradeSetupParams,
}

impl EngineConfig {
    /// Reject configurations that cannot produce meaningful indicators.
    pub fn validate(&self) -> EngineResult<()> {
        let ind = &self.indicators;
        let periods = [
            ("rsi_period", ind.rsi_period),
            ("sma_short", ind.sma_short),
            ("sma_long", ind.sma_long),
            ("ema_span", ind.ema_span),
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
        ];
        for (name, value) in periods {
            if !(1..=MAX_PERIOD).contains(&value) {
                return Err(EngineError::invalid_config(format!(
                    "{name} must be between 1 and {MAX_PERIOD}, got {value}"
                )));
            }
        }
        if ind.sma_short > ind.sma_long {
            return Err(EngineError::invalid_config(format!(
                "sma_short ({}) must not exceed sma_long ({})",
                ind.sma_short, ind.sma_long
            )));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(EngineError::invalid_config(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                ind.macd_fast, ind.macd_slow
            )));
        }

        let s = &self.scoring;
        if !(0.0..=100.0).contains(&s.rsi_oversold)
            || !(0.0..=100.0).contains(&s.rsi_overbought)
            || s.rsi_oversold >= s.rsi_overbought
        {
            return Err(EngineError::invalid_config(format!(
                "RSI bounds must satisfy 0 <= oversold ({}) < overbought ({}) <= 100",
                s.rsi_oversold, s.rsi_overbought
            )));
        }
        let points = [
            s.oversold_points,
            s.overbought_points,
            s.trend_points,
            s.momentum_points,
            s.close_above_mean_points,
            s.obv_above_mean_points,
        ];
        if points.iter().any(|p| !p.is_finite()) {
            return Err(EngineError::invalid_config("rule points must be finite"));
        }

        let p = &self.patterns;
        let t = &self.trade_setup;
        let fractions = [
            ("doji_body_pct", p.doji_body_pct),
            ("doji_range_multiple", p.doji_range_multiple),
            ("wick_body_multiple", p.wick_body_multiple),
            ("opposite_wick_pct", p.opposite_wick_pct),
            ("flat_body_pct", p.flat_body_pct),
            ("breakout_range_pct", p.breakout_range_pct),
            ("stop_loss_pct", t.stop_loss_pct),
            ("take_profit_pct", t.take_profit_pct),
        ];
        for (name, value) in fractions {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::invalid_config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.indicators.rsi_period, 14);
        assert_eq!(cfg.indicators.sma_short, 7);
        assert_eq!(cfg.indicators.sma_long, 14);
        assert_eq!(cfg.indicators.macd_fast, 12);
        assert_eq!(cfg.indicators.macd_slow, 26);
        assert_eq!(cfg.indicators.macd_signal, 9);
        assert_eq!(cfg.indicators.rsi_zero_loss, RsiZeroLossPolicy::ClampNeutral);
        assert!((cfg.trade_setup.stop_loss_pct - 0.05).abs() < f64::EPSILON);
        assert!((cfg.trade_setup.take_profit_pct - 0.02).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_warm_up_is_fifteen_bars() {
        assert_eq!(IndicatorParams::default().warm_up_bars(), 15);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "indicators": { "rsi_period": 9, "rsi_zero_loss": "undefined" } }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.indicators.rsi_period, 9);
        assert_eq!(cfg.indicators.rsi_zero_loss, RsiZeroLossPolicy::Undefined);
        assert_eq!(cfg.indicators.sma_long, 14);
        assert!((cfg.scoring.oversold_points - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_zero_period() {
        let mut cfg = EngineConfig::default();
        cfg.indicators.rsi_period = 0;
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_oversized_period() {
        let mut cfg = EngineConfig::default();
        cfg.indicators.rsi_period = usize::MAX;
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
        assert_eq!(cfg.indicators.warm_up_bars(), usize::MAX);

        let mut cfg = EngineConfig::default();
        cfg.indicators.macd_slow = MAX_PERIOD + 1;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.indicators.sma_long = MAX_PERIOD;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_windows() {
        let mut cfg = EngineConfig::default();
        cfg.indicators.macd_fast = 30;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.indicators.sma_short = 20;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.scoring.rsi_oversold = 80.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_fraction() {
        let mut cfg = EngineConfig::default();
        cfg.trade_setup.stop_loss_pct = -0.01;
        assert!(cfg.validate().is_err());
    }
}
