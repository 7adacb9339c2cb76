// =============================================================================
// MACD — Moving Average Convergence Divergence
// =============================================================================
//
//   MACD   = EMA(fast) - EMA(slow)
//   Signal = EMA(signal) of MACD
//   Hist   = MACD - Signal
//
// Built on the seeded EMA recurrence, so every bar is defined from index 0.

use serde::{Deserialize, Serialize};

use super::ema::calculate_ema;

/// Per-bar MACD output, all vectors index-aligned with the input closes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute MACD / Signal / Histogram.
///
/// Returns an empty `MacdSeries` when the input is empty or any span is 0.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    if closes.is_empty() || fast == 0 || slow == 0 || signal == 0 {
        return MacdSeries::default();
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let macd: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let signal = calculate_ema(&macd, signal);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}
