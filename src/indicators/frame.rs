// =============================================================================
// Indicator Frame — two-phase compute / finalize
// =============================================================================
//
// Phase 1 (`compute`): run every calculator over the full series.  Columns
// with a warm-up keep an explicit `None` for each undefined bar.
//
// Phase 2 (`finalize`): collect the rows where every column is defined,
// require the latest bar to be one of them, and reduce to what the scorer
// reads: the latest row plus the means of Close and OBV over the valid rows.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine_config::IndicatorParams;
use crate::error::{EngineError, EngineResult};
use crate::types::PriceSeries;

use super::ema::calculate_ema;
use super::macd::calculate_macd;
use super::obv::calculate_obv;
use super::rsi::calculate_rsi;
use super::sma::{calculate_sma, mean};

/// One fully-defined row of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: i64,
    pub close: f64,
    pub rsi: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub ema: f64,
    pub macd: f64,
    pub signal: f64,
    /// MACD minus signal.
    pub histogram: f64,
    pub obv: f64,
}

/// Per-bar indicator columns, index-aligned with the source series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    timestamps: Vec<i64>,
    close: Vec<f64>,
    rsi: Vec<Option<f64>>,
    sma_short: Vec<Option<f64>>,
    sma_long: Vec<Option<f64>>,
    ema: Vec<f64>,
    macd: Vec<f64>,
    signal: Vec<f64>,
    histogram: Vec<f64>,
    obv: Vec<f64>,
    warm_up: usize,
}

/// What survives `finalize`: everything the composite scorer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinalizedFrame {
    pub latest: IndicatorRow,
    /// Number of fully-defined rows.
    pub valid_rows: usize,
    /// Mean close over the fully-defined rows.
    pub close_mean: f64,
    /// Mean OBV over the fully-defined rows.
    pub obv_mean: f64,
}

impl IndicatorFrame {
    /// Phase 1: compute every column over the full series.
    pub fn compute(series: &PriceSeries, params: &IndicatorParams) -> Self {
        let closes = series.closes();
        let volumes = series.volumes();

        let macd = calculate_macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal);

        Self {
            timestamps: series.bars().iter().map(|b| b.timestamp).collect(),
            rsi: calculate_rsi(&closes, params.rsi_period, params.rsi_zero_loss),
            sma_short: calculate_sma(&closes, params.sma_short),
            sma_long: calculate_sma(&closes, params.sma_long),
            ema: calculate_ema(&closes, params.ema_span),
            macd: macd.macd,
            signal: macd.signal,
            histogram: macd.histogram,
            obv: calculate_obv(&closes, &volumes),
            close: closes,
            warm_up: params.warm_up_bars(),
        }
    }

    fn len(&self) -> usize {
        self.close.len()
    }

    /// The row at bar `i`, or `None` if any column is undefined there.
    pub fn row(&self, i: usize) -> Option<IndicatorRow> {
        let row = IndicatorRow {
            timestamp: *self.timestamps.get(i)?,
            close: *self.close.get(i)?,
            rsi: (*self.rsi.get(i)?)?,
            sma_short: (*self.sma_short.get(i)?)?,
            sma_long: (*self.sma_long.get(i)?)?,
            ema: *self.ema.get(i)?,
            macd: *self.macd.get(i)?,
            signal: *self.signal.get(i)?,
            histogram: *self.histogram.get(i)?,
            obv: *self.obv.get(i)?,
        };
        let values = [
            row.close,
            row.rsi,
            row.sma_short,
            row.sma_long,
            row.ema,
            row.macd,
            row.signal,
            row.histogram,
            row.obv,
        ];
        if values.iter().all(|v| v.is_finite()) {
            Some(row)
        } else {
            None
        }
    }

    /// Every fully-defined row, oldest first.
    pub fn valid_rows(&self) -> Vec<IndicatorRow> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }

    /// Phase 2: reduce to the scorer's inputs.
    ///
    /// Fails with `InsufficientHistory` when the series is shorter than the
    /// longest warm-up, and with `UndefinedLatest` when the latest bar is not
    /// fully defined.
    pub fn finalize(&self) -> EngineResult<FinalizedFrame> {
        if self.len() < self.warm_up {
            return Err(EngineError::InsufficientHistory {
                have: self.len(),
                need: self.warm_up,
            });
        }

        let valid = self.valid_rows();
        let latest = match valid.last() {
            Some(row) if Some(row.timestamp) == self.timestamps.last().copied() => *row,
            _ => {
                debug!(
                    bars = self.len(),
                    valid_rows = valid.len(),
                    "latest bar has an undefined indicator"
                );
                return Err(EngineError::UndefinedLatest {
                    bars: self.len(),
                    valid_rows: valid.len(),
                });
            }
        };

        let closes: Vec<f64> = valid.iter().map(|r| r.close).collect();
        let obvs: Vec<f64> = valid.iter().map(|r| r.obv).collect();

        Ok(FinalizedFrame {
            latest,
            valid_rows: valid.len(),
            close_mean: mean(&closes).unwrap_or(latest.close),
            obv_mean: mean(&obvs).unwrap_or(latest.obv),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::rsi::RsiZeroLossPolicy;
    use crate::types::PriceBar;

    fn series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                timestamp: i as i64 * 86_400,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 100.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn warm_up_rows_are_undefined() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let frame = IndicatorFrame::compute(&series(&closes), &IndicatorParams::default());
        assert_eq!(frame.len(), 20);
        assert!(frame.row(13).is_none());
        assert!(frame.row(14).is_some());
        assert_eq!(frame.valid_rows().len(), 6);
    }

    #[test]
    fn short_series_is_insufficient() {
        let frame = IndicatorFrame::compute(&series(&[10.0; 14]), &IndicatorParams::default());
        assert_eq!(
            frame.finalize(),
            Err(EngineError::InsufficientHistory { have: 14, need: 15 })
        );
    }

    #[test]
    fn finalize_means_cover_valid_rows_only() {
        let closes: Vec<f64> = (1..=16).map(|x| x as f64).collect();
        let frame = IndicatorFrame::compute(&series(&closes), &IndicatorParams::default());
        let done = frame.finalize().unwrap();
        // Valid rows are bars 14 and 15 (closes 15, 16; OBV 1400, 1500).
        assert_eq!(done.valid_rows, 2);
        assert!((done.close_mean - 15.5).abs() < 1e-10);
        assert!((done.obv_mean - 1450.0).abs() < 1e-10);
        assert_eq!(done.latest.close, 16.0);
    }

    #[test]
    fn undefined_latest_row_is_insufficient() {
        let params = IndicatorParams {
            rsi_zero_loss: RsiZeroLossPolicy::Undefined,
            ..IndicatorParams::default()
        };
        let frame = IndicatorFrame::compute(&series(&[10.0; 20]), &params);
        assert!(frame.valid_rows().is_empty());
        assert_eq!(
            frame.finalize(),
            Err(EngineError::UndefinedLatest {
                bars: 20,
                valid_rows: 0
            })
        );
    }

    #[test]
    fn flat_tail_reports_defined_rows() {
        // Rising run then a flat tail: RSI windows that are all flat are
        // undefined under `ClampUndefined`, earlier ones are not.
        let mut closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        closes.extend([15.0; 15]);
        let params = IndicatorParams {
            rsi_zero_loss: RsiZeroLossPolicy::ClampUndefined,
            ..IndicatorParams::default()
        };
        let frame = IndicatorFrame::compute(&series(&closes), &params);
        assert_eq!(
            frame.finalize(),
            Err(EngineError::UndefinedLatest {
                bars: 30,
                valid_rows: 14
            })
        );
    }

    #[test]
    fn flat_series_latest_row() {
        let frame = IndicatorFrame::compute(&series(&[10.0; 20]), &IndicatorParams::default());
        let done = frame.finalize().unwrap();
        assert_eq!(done.latest.rsi, 50.0);
        assert_eq!(done.latest.macd, 0.0);
        assert_eq!(done.latest.signal, 0.0);
        assert_eq!(done.latest.histogram, 0.0);
        assert_eq!(done.latest.obv, 0.0);
        assert_eq!(done.latest.ema, 10.0);
        assert_eq!(done.close_mean, 10.0);
    }
}
