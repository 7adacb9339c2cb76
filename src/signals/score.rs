// =============================================================================
// Composite Scorer — additive rule score over the finalized frame
// =============================================================================
//
// Every rule is evaluated (no early exit) against the latest valid row and the
// frame-wide means; the fired rules' points are summed and rounded to 2 dp.
//
//   RSI < oversold           => +15      RSI > overbought  => -10
//   SMA short > SMA long     => +10
//   MACD > Signal            => +10
//   Close > mean(Close)      => +5
//   OBV > mean(OBV)          => +5
//
// With the stock point values the score lies in [-10, 45].  It is a heuristic
// weighted rule score, not a probability.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine_config::ScoringRules;
use crate::indicators::rsi::{rsi_zone, RsiZone};
use crate::indicators::FinalizedFrame;

/// The individual rules of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    RsiOversold,
    RsiOverbought,
    ShortTermUptrend,
    BullishMomentum,
    CloseAboveMean,
    ObvAboveMean,
}

impl std::fmt::Display for ScoreRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RsiOversold => write!(f, "RSI oversold"),
            Self::RsiOverbought => write!(f, "RSI overbought"),
            Self::ShortTermUptrend => write!(f, "Short SMA above long SMA"),
            Self::BullishMomentum => write!(f, "MACD above signal"),
            Self::CloseAboveMean => write!(f, "Close above window mean"),
            Self::ObvAboveMean => write!(f, "OBV above window mean"),
        }
    }
}

/// The contribution of a single rule to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleContribution {
    pub rule: ScoreRule,
    pub fired: bool,
    /// Points added to the score (0 when the rule did not fire).
    pub points: f64,
}

/// Result of the composite scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Rounded to 2 decimal places.
    pub score: f64,
    /// `None` for the neutral (unscored) result.
    pub rsi_zone: Option<RsiZone>,
    pub contributions: Vec<RuleContribution>,
}

impl ScoreResult {
    /// The defined neutral result: score 0.0, nothing fired.
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            rsi_zone: None,
            contributions: Vec::new(),
        }
    }
}

/// The composite scoring engine.
#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    rules: ScoringRules,
}

impl CompositeScorer {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Score a finalized frame.
    pub fn score(&self, frame: &FinalizedFrame) -> ScoreResult {
        let r = &self.rules;
        let row = &frame.latest;

        let zone = rsi_zone(row.rsi, r.rsi_oversold, r.rsi_overbought);

        let checks = [
            (ScoreRule::RsiOversold, zone == RsiZone::Oversold, r.oversold_points),
            (ScoreRule::RsiOverbought, zone == RsiZone::Overbought, r.overbought_points),
            (ScoreRule::ShortTermUptrend, row.sma_short > row.sma_long, r.trend_points),
            (ScoreRule::BullishMomentum, row.macd > row.signal, r.momentum_points),
            (ScoreRule::CloseAboveMean, row.close > frame.close_mean, r.close_above_mean_points),
            (ScoreRule::ObvAboveMean, row.obv > frame.obv_mean, r.obv_above_mean_points),
        ];

        let mut contributions = Vec::with_capacity(checks.len());
        let mut total = 0.0;
        for (rule, fired, points) in checks {
            let points = if fired { points } else { 0.0 };
            total += points;
            contributions.push(RuleContribution {
                rule,
                fired,
                points,
            });
        }

        let score = round2(total);
        debug!(
            score,
            rsi = row.rsi,
            zone = %zone,
            valid_rows = frame.valid_rows,
            "composite score"
        );

        ScoreResult {
            score,
            rsi_zone: Some(zone),
            contributions,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
