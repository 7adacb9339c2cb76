// =============================================================================
// Signals Module
// =============================================================================
//
// Decision layer on top of the indicator frame:
// - Additive composite score (the only place rule weights live)
// - Candlestick pattern classifier (latest two bars)
// - Day-trade regime classifier (latest two bars)

pub mod candlestick;
pub mod day_trade;
pub mod score;

pub use candlestick::{detect_pattern, CandlePattern};
pub use day_trade::{detect_day_trade, DayTradeSignal};
pub use score::{CompositeScorer, RuleContribution, ScoreResult, ScoreRule};
