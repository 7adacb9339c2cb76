// =============================================================================
// Quote Source — daily chart fetch
// =============================================================================
//
// Fetches a bounded window of daily OHLCV bars for one ticker from a chart
// API and maps it to `RawBar` rows.  Days the source reports as `null` stay
// `None`; forward-filling is the engine's job (`PriceSeries::from_raw`).
//
// Every failure here (network, HTTP status, JSON shape) is a retryable
// "fetch failed" for the caller.  The engine never sees a partial response.
// =============================================================================

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::runtime_config::QuoteSourceConfig;
use crate::types::RawBar;

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

/// Parse a chart API response body into raw bars (oldest first).
pub fn parse_chart(body: &str) -> Result<Vec<RawBar>> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("chart response is not valid JSON")?;

    if let Some(err) = envelope.chart.error {
        bail!("chart API error {}: {}", err.code, err.description);
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context("chart response has no result")?;

    // A range with no trading days comes back without timestamps.
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .context("chart response has no quote block")?;

    let n = timestamps.len();
    let column = |name: &str, values: Option<Vec<Option<f64>>>| -> Result<Vec<Option<f64>>> {
        let values = values.with_context(|| format!("quote block is missing `{name}`"))?;
        if values.len() != n {
            bail!("`{name}` has {} entries but there are {n} timestamps", values.len());
        }
        Ok(values)
    };

    let open = column("open", quote.open)?;
    let high = column("high", quote.high)?;
    let low = column("low", quote.low)?;
    let close = column("close", quote.close)?;
    let volume = column("volume", quote.volume)?;

    let bars = (0..n)
        .map(|i| RawBar {
            timestamp: timestamps[i],
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        })
        .collect();

    Ok(bars)
}

/// Reject tickers that cannot be a single URL path segment.
pub fn validate_ticker(ticker: &str) -> Result<String> {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        bail!("ticker is empty");
    }
    if ticker.len() > 16 {
        bail!("ticker `{ticker}` is too long");
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
    {
        bail!("ticker `{ticker}` contains unsupported characters");
    }
    Ok(ticker)
}

// ---------------------------------------------------------------------------
// QuoteClient
// ---------------------------------------------------------------------------

/// HTTP client for the chart API.
#[derive(Clone)]
pub struct QuoteClient {
    client: reqwest::Client,
    config: QuoteSourceConfig,
}

impl QuoteClient {
    pub fn new(config: QuoteSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("ticker-insight/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %config.base_url, "QuoteClient initialised");
        Ok(Self { client, config })
    }

    /// GET /v8/finance/chart/{ticker} for the configured range / interval.
    #[instrument(skip(self), name = "quotes::fetch_daily")]
    pub async fn fetch_daily(&self, ticker: &str) -> Result<Vec<RawBar>> {
        let ticker = validate_ticker(ticker)?;
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.config.base_url.trim_end_matches('/'),
            ticker
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("range", self.config.range.as_str()),
                ("interval", self.config.interval.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("GET {url} request failed"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read chart response for {ticker}"))?;

        if !status.is_success() {
            warn!(%ticker, %status, "chart request rejected");
            bail!("chart API returned {status} for {ticker}");
        }

        let bars = parse_chart(&body).with_context(|| format!("bad chart payload for {ticker}"))?;
        debug!(%ticker, bars = bars.len(), "daily bars fetched");
        Ok(bars)
    }
}

impl std::fmt::Debug for QuoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteClient")
            .field("base_url", &self.config.base_url)
            .field("range", &self.config.range)
            .field("interval", &self.config.interval)
            .finish()
    }
}
