// =============================================================================
// Candlestick Pattern Classifier
// =============================================================================
//
// Looks at the latest bar and the one before it.  Rules are evaluated
// top-to-bottom; first match wins:
//
//   1. Doji               body < 2% of close AND range > 3x body
//   2. Bullish Engulfing  up bar, opens below prior low, closes above prior high
//   3. Bearish Engulfing  down bar, opens above prior high, closes below prior low
//   4. Shooting Star      upper wick > 2x body AND lower wick < 10% of close
//   5. Hammer             lower wick > 2x body AND upper wick < 10% of close
//
// Otherwise no pattern.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::engine_config::PatternThresholds;
use crate::types::{PriceBar, PriceSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Doji,
    BullishEngulfing,
    BearishEngulfing,
    ShootingStar,
    Hammer,
    #[default]
    None,
}

impl CandlePattern {
    pub fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl std::fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Doji => write!(f, "Doji"),
            Self::BullishEngulfing => write!(f, "Bullish Engulfing"),
            Self::BearishEngulfing => write!(f, "Bearish Engulfing"),
            Self::ShootingStar => write!(f, "Shooting Star"),
            Self::Hammer => write!(f, "Hammer"),
            Self::None => write!(f, "No pattern"),
        }
    }
}

type Predicate = fn(prev: &PriceBar, last: &PriceBar, t: &PatternThresholds) -> bool;

/// Priority-ordered rule table.
const RULES: [(CandlePattern, Predicate); 5] = [
    (CandlePattern::Doji, is_doji),
    (CandlePattern::BullishEngulfing, is_bullish_engulfing),
    (CandlePattern::BearishEngulfing, is_bearish_engulfing),
    (CandlePattern::ShootingStar, is_shooting_star),
    (CandlePattern::Hammer, is_hammer),
];

/// Classify `last` given the bar before it.
pub fn classify_candle(prev: &PriceBar, last: &PriceBar, t: &PatternThresholds) -> CandlePattern {
    RULES
        .iter()
        .find(|(_, matches)| matches(prev, last, t))
        .map(|(pattern, _)| *pattern)
        .unwrap_or_default()
}

/// Classify the latest bar of a series; `None` pattern with fewer than 2 bars.
pub fn detect_pattern(series: &PriceSeries, t: &PatternThresholds) -> CandlePattern {
    match series.last_two() {
        Some((prev, last)) => classify_candle(prev, last, t),
        None => CandlePattern::None,
    }
}

// =============================================================================
// Predicates
// =============================================================================

fn is_doji(_prev: &PriceBar, last: &PriceBar, t: &PatternThresholds) -> bool {
    let body = last.body();
    body < t.doji_body_pct * last.close && last.range() > t.doji_range_multiple * body
}

fn is_bullish_engulfing(prev: &PriceBar, last: &PriceBar, _t: &PatternThresholds) -> bool {
    last.is_bullish() && last.open < prev.low && last.close > prev.high
}

fn is_bearish_engulfing(prev: &PriceBar, last: &PriceBar, _t: &PatternThresholds) -> bool {
    last.is_bearish() && last.open > prev.high && last.close < prev.low
}

fn is_shooting_star(_prev: &PriceBar, last: &PriceBar, t: &PatternThresholds) -> bool {
    last.upper_wick() > t.wick_body_multiple * last.body()
        && last.lower_wick() < t.opposite_wick_pct * last.close
}

fn is_hammer(_prev: &PriceBar, last: &PriceBar, t: &PatternThresholds) -> bool {
    last.lower_wick() > t.wick_body_multiple * last.body()
        && last.upper_wick() < t.opposite_wick_pct * last.close
}
