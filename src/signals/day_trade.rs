// =============================================================================
// Day-Trade Regime Classifier
// =============================================================================
//
// Reads the gap between the prior close and the latest open, plus the shape
// of the latest bar.  First match wins:
//
//   1. Gap up   AND bullish close  => momentum
//   2. Gap down AND bearish close  => selloff caution
//   3. Body < 0.5% of close AND range > 2% of close => breakout watch
//
// Otherwise no signal.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::engine_config::PatternThresholds;
use crate::types::{PriceBar, PriceSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayTradeSignal {
    GapUpMomentum,
    GapDownSelloff,
    BreakoutWatch,
    #[default]
    None,
}

impl DayTradeSignal {
    pub fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl std::fmt::Display for DayTradeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GapUpMomentum => write!(f, "Gap up with bullish close: momentum"),
            Self::GapDownSelloff => write!(f, "Gap down with bearish close: selloff caution"),
            Self::BreakoutWatch => write!(f, "Tight body, wide range: breakout watch"),
            Self::None => write!(f, "No signal"),
        }
    }
}

type Predicate = fn(prev: &PriceBar, last: &PriceBar, t: &PatternThresholds) -> bool;

const RULES: [(DayTradeSignal, Predicate); 3] = [
    (DayTradeSignal::GapUpMomentum, is_gap_up_momentum),
    (DayTradeSignal::GapDownSelloff, is_gap_down_selloff),
    (DayTradeSignal::BreakoutWatch, is_breakout_watch),
];

/// Classify `last` given the bar before it.
pub fn classify_day_trade(
    prev: &PriceBar,
    last: &PriceBar,
    t: &PatternThresholds,
) -> DayTradeSignal {
    RULES
        .iter()
        .find(|(_, matches)| matches(prev, last, t))
        .map(|(signal, _)| *signal)
        .unwrap_or_default()
}

/// Classify the latest bar of a series; no signal with fewer than 2 bars.
pub fn detect_day_trade(series: &PriceSeries, t: &PatternThresholds) -> DayTradeSignal {
    match series.last_two() {
        Some((prev, last)) => classify_day_trade(prev, last, t),
        None => DayTradeSignal::None,
    }
}

// =============================================================================
// Predicates
// =============================================================================

fn is_gap_up_momentum(prev: &PriceBar, last: &PriceBar, _t: &PatternThresholds) -> bool {
    last.open > prev.close && last.is_bullish()
}

fn is_gap_down_selloff(prev: &PriceBar, last: &PriceBar, _t: &PatternThresholds) -> bool {
    last.open < prev.close && last.is_bearish()
}

fn is_breakout_watch(_prev: &PriceBar, last: &PriceBar, t: &PatternThresholds) -> bool {
    last.body() < t.flat_body_pct * last.close && last.range() > t.breakout_range_pct * last.close
}
