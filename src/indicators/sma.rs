// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Trailing arithmetic mean over `window` bars:
//   SMA_t = (close_{t-window+1} + ... + close_t) / window
//
// Each window is summed directly rather than with a running add/subtract so
// that equal inputs always produce bit-identical means.

/// Compute the per-bar SMA series.
///
/// Output is index-aligned with `closes`; the first `window - 1` bars are
/// `None`.  A `window` of 0, or a window containing a non-finite close, also
/// yields `None`.
pub fn calculate_sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if window == 0 || closes.len() < window {
        return result;
    }

    let window_f = window as f64;
    for (i, w) in closes.windows(window).enumerate() {
        let mean = w.iter().sum::<f64>() / window_f;
        if mean.is_finite() {
            result[i + window - 1] = Some(mean);
        }
    }
    result
}

/// Arithmetic mean of a slice, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
