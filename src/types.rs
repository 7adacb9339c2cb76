// =============================================================================
// Shared types used across the ticker-insight engine
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// One daily bar as delivered by a quote source, before forward-filling.
///
/// Any field may be `None` (the source reported `null` for that day).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// Bar open time, unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// A fully-defined OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Absolute distance between open and close.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full high-to-low range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    fn validate(&self) -> EngineResult<()> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(EngineError::malformed(format!(
                    "{name} is not finite at timestamp {}",
                    self.timestamp
                )));
            }
            if value < 0.0 {
                return Err(EngineError::malformed(format!(
                    "{name} is negative ({value}) at timestamp {}",
                    self.timestamp
                )));
            }
        }
        if self.low > self.open.min(self.close) || self.high < self.open.max(self.close) {
            return Err(EngineError::malformed(format!(
                "open/close outside low..high at timestamp {} (o={} h={} l={} c={})",
                self.timestamp, self.open, self.high, self.low, self.close
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PriceSeries
// ---------------------------------------------------------------------------

/// Ordered, immutable sequence of complete bars for one ticker.
///
/// Guaranteed non-empty with strictly increasing timestamps, finite
/// non-negative values, and open/close inside each bar's low..high.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from already-complete bars.
    pub fn new(bars: Vec<PriceBar>) -> EngineResult<Self> {
        if bars.is_empty() {
            return Err(EngineError::malformed("price series is empty"));
        }
        for bar in &bars {
            bar.validate()?;
        }
        ensure_time_ordered(bars.iter().map(|b| b.timestamp))?;
        Ok(Self { bars })
    }

    /// Build a series from raw quote rows.
    ///
    /// Each missing field is forward-filled from the nearest earlier bar.
    /// Leading bars that still have an undefined field (nothing to fill from)
    /// are dropped.
    pub fn from_raw(raw: Vec<RawBar>) -> EngineResult<Self> {
        if raw.is_empty() {
            return Err(EngineError::malformed("price series is empty"));
        }
        ensure_time_ordered(raw.iter().map(|r| r.timestamp))?;

        let mut last = [None::<f64>; 5];
        let mut bars = Vec::with_capacity(raw.len());
        let mut dropped = 0usize;

        for row in &raw {
            let fields = [row.open, row.high, row.low, row.close, row.volume];
            for (slot, value) in last.iter_mut().zip(fields) {
                if value.is_some() {
                    *slot = value;
                }
            }

            match last {
                [Some(open), Some(high), Some(low), Some(close), Some(volume)] => {
                    bars.push(PriceBar {
                        timestamp: row.timestamp,
                        open,
                        high,
                        low,
                        close,
                        volume,
                    });
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(dropped, "leading bars without prior value dropped");
        }
        if bars.is_empty() {
            return Err(EngineError::malformed(
                "no bar has every OHLCV field defined",
            ));
        }

        Self::new(bars)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// The most recent bar.
    pub fn latest(&self) -> &PriceBar {
        // Non-empty by construction.
        &self.bars[self.bars.len() - 1]
    }

    /// `(previous, latest)` when at least two bars exist.
    pub fn last_two(&self) -> Option<(&PriceBar, &PriceBar)> {
        match self.bars.as_slice() {
            [.., prev, last] => Some((prev, last)),
            _ => None,
        }
    }
}

fn ensure_time_ordered(timestamps: impl Iterator<Item = i64>) -> EngineResult<()> {
    let mut prev: Option<i64> = None;
    for ts in timestamps {
        if let Some(p) = prev {
            if ts <= p {
                return Err(EngineError::malformed(format!(
                    "timestamps not strictly increasing ({p} then {ts})"
                )));
            }
        }
        prev = Some(ts);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PositionInput
// ---------------------------------------------------------------------------

/// User-supplied position details used by the trade-setup projector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionInput {
    /// Share count, must be positive.
    pub shares: u32,
    /// Purchase price per share; `0.0` means "not tracked".
    #[serde(default)]
    pub purchase_price: f64,
}

impl PositionInput {
    pub fn new(shares: u32, purchase_price: f64) -> EngineResult<Self> {
        let input = Self {
            shares,
            purchase_price,
        };
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.shares == 0 {
            return Err(EngineError::malformed("share count must be positive"));
        }
        if !self.purchase_price.is_finite() || self.purchase_price < 0.0 {
            return Err(EngineError::malformed(format!(
                "purchase price must be a non-negative number, got {}",
                self.purchase_price
            )));
        }
        Ok(())
    }

    pub fn tracks_purchase(&self) -> bool {
        self.purchase_price > 0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn raw(ts: i64, close: Option<f64>) -> RawBar {
        RawBar {
            timestamp: ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: close.map(|_| 100.0),
        }
    }

    #[test]
    fn from_raw_forward_fills_gaps() {
        let mut rows = vec![raw(1, Some(10.0)), raw(2, None), raw(3, Some(12.0))];
        rows[1].volume = Some(50.0);
        let series = PriceSeries::from_raw(rows).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.bars()[1].close, 10.0);
        assert_eq!(series.bars()[1].volume, 50.0);
    }

    #[test]
    fn from_raw_drops_leading_undefined_bars() {
        let rows = vec![raw(1, None), raw(2, Some(10.0)), raw(3, Some(11.0))];
        let series = PriceSeries::from_raw(rows).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].timestamp, 2);
    }

    #[test]
    fn from_raw_partial_first_bar_waits_for_every_field() {
        let mut first = raw(1, Some(10.0));
        first.volume = None;
        let rows = vec![first, raw(2, Some(11.0))];
        let series = PriceSeries::from_raw(rows).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest().close, 11.0);
    }

    #[test]
    fn empty_series_is_malformed() {
        assert!(matches!(
            PriceSeries::from_raw(Vec::new()),
            Err(EngineError::MalformedInput(_))
        ));
        assert!(matches!(
            PriceSeries::new(Vec::new()),
            Err(EngineError::MalformedInput(_))
        ));
    }

    #[test]
    fn all_null_series_is_malformed() {
        let rows = vec![raw(1, None), raw(2, None)];
        assert!(matches!(
            PriceSeries::from_raw(rows),
            Err(EngineError::MalformedInput(_))
        ));
    }

    #[test]
    fn duplicate_timestamps_rejected() {
        let rows = vec![raw(1, Some(10.0)), raw(1, Some(11.0))];
        assert!(matches!(
            PriceSeries::from_raw(rows),
            Err(EngineError::MalformedInput(_))
        ));
    }

    #[test]
    fn negative_and_non_finite_values_rejected() {
        assert!(PriceSeries::from_raw(vec![raw(1, Some(-1.0))]).is_err());
        assert!(PriceSeries::from_raw(vec![raw(1, Some(f64::NAN))]).is_err());
    }

    #[test]
    fn inconsistent_bar_geometry_rejected() {
        let mut close_above_high = raw(1, Some(10.0));
        close_above_high.close = Some(10.5);
        assert!(matches!(
            PriceSeries::from_raw(vec![close_above_high]),
            Err(EngineError::MalformedInput(_))
        ));

        let mut open_below_low = raw(1, Some(10.0));
        open_below_low.open = Some(9.5);
        assert!(matches!(
            PriceSeries::from_raw(vec![open_below_low]),
            Err(EngineError::MalformedInput(_))
        ));

        let mut wide = raw(1, Some(10.0));
        wide.high = Some(11.0);
        wide.low = Some(9.0);
        assert!(PriceSeries::from_raw(vec![wide]).is_ok());
    }

    #[test]
    fn last_two_needs_two_bars() {
        let one = PriceSeries::from_raw(vec![raw(1, Some(10.0))]).unwrap();
        assert!(one.last_two().is_none());
        let two = PriceSeries::from_raw(vec![raw(1, Some(10.0)), raw(2, Some(11.0))]).unwrap();
        let (prev, last) = two.last_two().unwrap();
        assert_eq!(prev.close, 10.0);
        assert_eq!(last.close, 11.0);
    }

    #[test]
    fn bar_geometry() {
        let bar = PriceBar {
            timestamp: 0,
            open: 10.0,
            high: 12.0,
            low: 9.0,
            close: 11.0,
            volume: 1.0,
        };
        assert_eq!(bar.body(), 1.0);
        assert_eq!(bar.range(), 3.0);
        assert_eq!(bar.upper_wick(), 1.0);
        assert_eq!(bar.lower_wick(), 1.0);
        assert!(bar.is_bullish());
    }

    #[test]
    fn position_input_validation() {
        assert!(PositionInput::new(0, 10.0).is_err());
        assert!(PositionInput::new(5, -1.0).is_err());
        assert!(PositionInput::new(5, f64::INFINITY).is_err());
        let p = PositionInput::new(5, 0.0).unwrap();
        assert!(!p.tracks_purchase());
    }
}
