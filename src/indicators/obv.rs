// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// Running total starting at 0 on the first bar:
//   close_t > close_{t-1}  =>  OBV_t = OBV_{t-1} + volume_t
//   close_t < close_{t-1}  =>  OBV_t = OBV_{t-1} - volume_t
//   otherwise              =>  OBV_t = OBV_{t-1}
//
// Strictly sequential; order of bars matters.

/// Compute the per-bar OBV series.
///
/// `closes` and `volumes` must be the same length; extra elements of the
/// longer slice are ignored.
pub fn calculate_obv(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let n = closes.len().min(volumes.len());
    if n == 0 {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(n);
    let mut running = 0.0_f64;
    result.push(running);

    for i in 1..n {
        if closes[i] > closes[i - 1] {
            running += volumes[i];
        } else if closes[i] < closes[i - 1] {
            running -= volumes[i];
        }
        result.push(running);
    }

    result
}
