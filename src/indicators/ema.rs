// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Formula:
//   alpha  = 2 / (span + 1)
//   EMA_0  = close_0
//   EMA_t  = alpha * close_t + (1 - alpha) * EMA_{t-1}
//
// Evaluated as EMA_{t-1} + alpha * (close_t - EMA_{t-1}), which is the same
// recurrence but leaves a constant series exactly unchanged.
//
// Unlike SMA/RSI there is no warm-up: every bar has a value.
// =============================================================================

/// Compute the EMA series for `closes` with smoothing span `span`.
///
/// Output is index-aligned with `closes`.
///
/// # Edge cases
/// - `span == 0` => empty vec (no valid smoothing factor)
/// - empty input => empty vec
/// - A non-finite close poisons every later value; callers that need a
///   defined value check `is_finite`.
pub fn calculate_ema(closes: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || closes.is_empty() {
        return Vec::new();
    }

    let alpha = 2.0 / (span as f64 + 1.0);

    let mut result = Vec::with_capacity(closes.len());
    let mut prev = closes[0];
    result.push(prev);

    for &close in &closes[1..] {
        let ema = prev + alpha * (close - prev);
        result.push(ema);
        prev = ema;
    }

    result
}
