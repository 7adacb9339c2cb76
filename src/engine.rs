// =============================================================================
// Indicator Engine — raw series in, score / signals / setup out
// =============================================================================
//
// Pipeline (single-threaded, no I/O, no process-wide state):
//
//   PriceSeries ─► IndicatorFrame::compute ─► finalize ─► CompositeScorer
//              ├─► candlestick classifier      (latest 2 bars)
//              ├─► day-trade classifier        (latest 2 bars)
//              └─► trade setup + P&L projector (latest bar)
//
// Fewer bars than the longest warm-up yields the neutral result: score 0.0,
// no pattern, no signal.  The trade setup only needs the latest bar and is
// always projected.
//
// The same input always produces the same `Analysis`.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine_config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::indicators::{IndicatorFrame, IndicatorRow};
use crate::signals::{
    detect_day_trade, detect_pattern, CandlePattern, CompositeScorer, DayTradeSignal, ScoreResult,
};
use crate::trade_setup::{PositionPnl, TradeSetup};
use crate::types::{PositionInput, PriceSeries, RawBar};

/// Everything the presentation layer shows for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub ticker: String,
    /// RFC 3339 time of the latest bar.
    pub as_of: Option<String>,
    pub bars_used: usize,
    /// `true` when the neutral result was returned for lack of history.
    pub insufficient_history: bool,
    /// Heuristic weighted rule score, not a probability.
    pub score: f64,
    pub score_detail: ScoreResult,
    pub latest_indicators: Option<IndicatorRow>,
    pub candle_pattern: CandlePattern,
    pub day_trade_signal: DayTradeSignal,
    pub trade_setup: TradeSetup,
    pub position: PositionPnl,
}

/// Stateless engine bound to one immutable `EngineConfig`.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: EngineConfig,
    scorer: CompositeScorer,
}

impl IndicatorEngine {
    /// Build an engine; fails with `InvalidConfig` on unusable parameters.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let scorer = CompositeScorer::new(config.scoring.clone());
        Ok(Self { config, scorer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Forward-fill raw quote rows, then analyse them.
    pub fn analyze_raw(
        &self,
        ticker: &str,
        raw: Vec<RawBar>,
        position: &PositionInput,
    ) -> EngineResult<Analysis> {
        let series = PriceSeries::from_raw(raw)?;
        self.analyze(ticker, &series, position)
    }

    /// Run the full pipeline over `series`.
    pub fn analyze(
        &self,
        ticker: &str,
        series: &PriceSeries,
        position: &PositionInput,
    ) -> EngineResult<Analysis> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(EngineError::malformed("ticker is empty"));
        }
        position.validate()?;

        let latest = series.latest();
        let trade_setup = TradeSetup::project(latest, position.shares, &self.config.trade_setup);
        let pnl = PositionPnl::compute(latest.close, position);
        let as_of = chrono::DateTime::from_timestamp(latest.timestamp, 0).map(|t| t.to_rfc3339());

        let frame = IndicatorFrame::compute(series, &self.config.indicators);
        let finalized = match frame.finalize() {
            Ok(finalized) => finalized,
            Err(err) if err.is_unscoreable() => {
                info!(
                    ticker,
                    bars = series.len(),
                    reason = %err,
                    "nothing to score, returning neutral result"
                );
                return Ok(Analysis {
                    ticker: ticker.to_string(),
                    as_of,
                    bars_used: series.len(),
                    insufficient_history: true,
                    score: 0.0,
                    score_detail: ScoreResult::neutral(),
                    latest_indicators: None,
                    candle_pattern: CandlePattern::None,
                    day_trade_signal: DayTradeSignal::None,
                    trade_setup,
                    position: pnl,
                });
            }
            Err(other) => return Err(other),
        };

        let score_detail = self.scorer.score(&finalized);
        let candle_pattern = detect_pattern(series, &self.config.patterns);
        let day_trade_signal = detect_day_trade(series, &self.config.patterns);

        debug!(
            ticker,
            score = score_detail.score,
            pattern = %candle_pattern,
            signal = %day_trade_signal,
            "analysis complete"
        );

        Ok(Analysis {
            ticker: ticker.to_string(),
            as_of,
            bars_used: series.len(),
            insufficient_history: false,
            score: score_detail.score,
            score_detail,
            latest_indicators: Some(finalized.latest),
            candle_pattern,
            day_trade_signal,
            trade_setup,
            position: pnl,
        })
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            scorer: CompositeScorer::default(),
        }
    }
}
