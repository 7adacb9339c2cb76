// =============================================================================
// Relative Strength Index (RSI) — trailing simple averages
// =============================================================================
//
// Step 1: Bar-to-bar change of the closes.
// Step 2: gain = change if positive else 0; loss = -change if negative else 0.
// Step 3: Trailing simple mean of gains / losses over `period` changes.
// Step 4: RS  = avg_gain / avg_loss
//         RSI = 100 - 100 / (1 + RS)
//
// Output is index-aligned with `closes`.  Bar 0 has no change, so the first
// defined value sits at index `period`.
//
// avg_loss == 0 makes RS infinite; what happens then is decided by
// `RsiZeroLossPolicy` rather than left to float semantics.
// =============================================================================

use serde::{Deserialize, Serialize};

/// What RSI reports when the trailing average loss is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZeroLossPolicy {
    /// Only gains => 100.  No movement at all => 50 (neutral).
    #[default]
    ClampNeutral,
    /// Only gains => 100.  No movement at all => undefined.
    ClampUndefined,
    /// Any zero average loss => undefined.
    Undefined,
}

/// Coarse reading of an RSI value against oversold / overbought bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oversold => write!(f, "OVERSOLD"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Overbought => write!(f, "OVERBOUGHT"),
        }
    }
}

/// Compute the per-bar RSI series for `closes`.
///
/// # Edge cases
/// - `period == 0` => every bar undefined
/// - bars `0..period` => undefined (warm-up)
/// - zero average loss => resolved by `policy`
/// - non-finite results => undefined
pub fn calculate_rsi(closes: &[f64], period: usize, policy: RsiZeroLossPolicy) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return result;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let period_f = period as f64;

    // deltas[k] is the change arriving at bar k + 1.
    for (i, slot) in result.iter_mut().enumerate().skip(period) {
        let window = &deltas[i - period..i];
        if window.iter().any(|d| !d.is_finite()) {
            continue;
        }
        let (sum_gain, sum_loss) = window.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else if d < 0.0 {
                (g, l - d)
            } else {
                (g, l)
            }
        });
        *slot = rsi_from_averages(sum_gain / period_f, sum_loss / period_f, policy);
    }

    result
}

/// Classify `value` against the oversold / overbought bounds (strict).
pub fn rsi_zone(value: f64, oversold: f64, overbought: f64) -> RsiZone {
    if value < oversold {
        RsiZone::Oversold
    } else if value > overbought {
        RsiZone::Overbought
    } else {
        RsiZone::Neutral
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

fn rsi_from_averages(avg_gain: f64, avg_loss: f64, policy: RsiZeroLossPolicy) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        match (policy, avg_gain == 0.0) {
            (RsiZeroLossPolicy::Undefined, _) => return None,
            (RsiZeroLossPolicy::ClampNeutral, true) => 50.0,
            (RsiZeroLossPolicy::ClampUndefined, true) => return None,
            (_, false) => 100.0,
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi)
    } else {
        None
    }
}
