// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  There is no authentication.
//
//   GET  /api/v1/health
//   GET  /api/v1/config              current engine config
//   POST /api/v1/config              replace engine config (validated, saved)
//   GET  /api/v1/analysis/:ticker    fetch daily bars, then analyse
//   POST /api/v1/analysis            analyse caller-supplied bars
//
// Status mapping:
//   400  undecodable query / JSON body, empty ticker, zero shares, invalid
//        engine config
//   422  malformed bar data or position input
//   502  quote fetch failed (`"retryable": true`)
//
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::engine::Analysis;
use crate::engine_config::EngineConfig;
use crate::error::EngineError;
use crate::quotes::validate_ticker;
use crate::types::{PositionInput, RawBar};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/config", get(get_config).post(set_config))
        .route("/api/v1/analysis", post(analyze_bars))
        .route("/api/v1/analysis/:ticker", get(analyze_ticker))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// Request-level failure, rendered as `{ "error": ..., "retryable": ... }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unprocessable(String),
    FetchFailed(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::FetchFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidConfig(_) => Self::BadRequest(err.to_string()),
            EngineError::MalformedInput(_)
            | EngineError::InsufficientHistory { .. }
            | EngineError::UndefinedLatest { .. } => Self::Unprocessable(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("invalid query: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retryable = matches!(self, Self::FetchFailed(_));
        let message = match self {
            Self::BadRequest(m)
            | Self::Unprocessable(m)
            | Self::FetchFailed(m)
            | Self::Internal(m) => m,
        };
        let body = serde_json::json!({
            "error": message,
            "retryable": retryable,
        });
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    analyses_served: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        analyses_served: state.analyses_served(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Engine config
// =============================================================================

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine_config())
}

async fn set_config(
    State(state): State<Arc<AppState>>,
    body: Result<Json<EngineConfig>, JsonRejection>,
) -> Result<Json<EngineConfig>, ApiError> {
    let Json(config) = body?;
    config.validate()?;
    state.replace_engine_config(config.clone()).map_err(|e| {
        warn!(error = %e, "failed to persist engine config");
        ApiError::Internal(format!("{e:#}"))
    })?;
    info!("engine config updated via API");
    Ok(Json(config))
}

// =============================================================================
// Analysis
// =============================================================================

/// Response envelope: a fresh id and timestamp around the deterministic
/// engine output.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: uuid::Uuid,
    pub generated_at: String,
    #[serde(flatten)]
    pub analysis: Analysis,
}

impl AnalysisResponse {
    fn wrap(analysis: Analysis) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            analysis,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PositionQuery {
    shares: Option<u32>,
    purchase_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeBarsRequest {
    ticker: String,
    shares: Option<u32>,
    purchase_price: Option<f64>,
    bars: Vec<RawBar>,
}

/// Apply the default share count and turn the caller's position into a
/// validated `PositionInput`.
fn position_input(
    state: &AppState,
    shares: Option<u32>,
    purchase_price: Option<f64>,
) -> Result<PositionInput, ApiError> {
    let shares = shares.unwrap_or_else(|| state.default_shares());
    if shares == 0 {
        return Err(ApiError::BadRequest("shares must be positive".into()));
    }
    Ok(PositionInput::new(shares, purchase_price.unwrap_or(0.0))?)
}

fn checked_ticker(ticker: &str) -> Result<String, ApiError> {
    validate_ticker(ticker).map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn analyze_ticker(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    query: Result<Query<PositionQuery>, QueryRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Query(query) = query?;
    let ticker = checked_ticker(&ticker)?;
    let position = position_input(&state, query.shares, query.purchase_price)?;
    let engine = state.engine()?;

    let raw = state
        .quote_client
        .fetch_daily(&ticker)
        .await
        .map_err(|e| {
            warn!(%ticker, error = %e, "quote fetch failed");
            ApiError::FetchFailed(format!("fetch failed: {e:#}"))
        })?;

    let analysis = engine.analyze_raw(&ticker, raw, &position)?;
    state.record_analysis();
    info!(%ticker, score = analysis.score, bars = analysis.bars_used, "analysis served");
    Ok(Json(AnalysisResponse::wrap(analysis)))
}

async fn analyze_bars(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeBarsRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Json(req) = body?;
    let ticker = checked_ticker(&req.ticker)?;
    let position = position_input(&state, req.shares, req.purchase_price)?;
    let engine = state.engine()?;

    let analysis = engine.analyze_raw(&ticker, req.bars, &position)?;
    state.record_analysis();
    info!(%ticker, score = analysis.score, bars = analysis.bars_used, "analysis served");
    Ok(Json(AnalysisResponse::wrap(analysis)))
}

// =============================================================================
// Router Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::runtime_config::RuntimeConfig;

    fn app() -> (Router, Arc<AppState>) {
        let mut config = RuntimeConfig::default();
        // Nothing listens on the discard port; fetches fail fast.
        config.quote_source.base_url = "http://127.0.0.1:9".to_string();
        config.quote_source.timeout_secs = 2;
        let state = Arc::new(AppState::new(config, None).unwrap());
        (router(state.clone()), state)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn bars(closes: &[f64]) -> serde_json::Value {
        let rows: Vec<_> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                serde_json::json!({
                    "timestamp": 1_700_000_000 + i as i64 * 86_400,
                    "open": c,
                    "high": c + 0.5,
                    "low": c - 0.5,
                    "close": c,
                    "volume": 1000.0,
                })
            })
            .collect();
        serde_json::Value::Array(rows)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app();
        let (status, body) = send(app, get_req("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn analyze_supplied_bars() {
        let (app, state) = app();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let req = post_json(
            "/api/v1/analysis",
            serde_json::json!({
                "ticker": "msft",
                "shares": 10,
                "purchase_price": 95.0,
                "bars": bars(&closes),
            }),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["ticker"], "MSFT");
        assert_eq!(body["insufficient_history"], false);
        assert!(body["id"].is_string());
        assert!(body["generated_at"].is_string());
        assert_eq!(body["position"]["tracked"], true);
        assert_eq!(state.analyses_served(), 1);
    }

    #[tokio::test]
    async fn short_history_is_neutral_not_an_error() {
        let (app, _) = app();
        let req = post_json(
            "/api/v1/analysis",
            serde_json::json!({ "ticker": "AAPL", "bars": bars(&[10.0, 11.0, 12.0]) }),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insufficient_history"], true);
        assert_eq!(body["score"], 0.0);
        assert_eq!(body["candle_pattern"], "none");
        // Default share count applies.
        assert_eq!(body["trade_setup"]["shares"], 10);
    }

    #[tokio::test]
    async fn zero_shares_is_bad_request() {
        let (app, _) = app();
        let req = post_json(
            "/api/v1/analysis",
            serde_json::json!({ "ticker": "AAPL", "shares": 0, "bars": bars(&[10.0]) }),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn empty_ticker_is_bad_request() {
        let (app, _) = app();
        let req = post_json(
            "/api/v1/analysis",
            serde_json::json!({ "ticker": "  ", "bars": bars(&[10.0]) }),
        );
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_bars_are_unprocessable() {
        let (app, _) = app();
        let mut rows = bars(&[10.0, 11.0]);
        rows[1]["timestamp"] = serde_json::json!(1_600_000_000);
        let req = post_json(
            "/api/v1/analysis",
            serde_json::json!({ "ticker": "AAPL", "bars": rows }),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }

    #[tokio::test]
    async fn empty_bars_are_unprocessable() {
        let (app, _) = app();
        let req = post_json(
            "/api/v1/analysis",
            serde_json::json!({ "ticker": "AAPL", "bars": [] }),
        );
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn fetch_failure_is_retryable_bad_gateway() {
        let (app, _) = app();
        let (status, body) = send(app, get_req("/api/v1/analysis/AAPL?shares=5")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn bad_query_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(app, get_req("/api/v1/analysis/AAPL?shares=-3")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid query"), "{body}");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn mistyped_config_field_is_bad_request_with_envelope() {
        let (app, state) = app();
        let req = post_json(
            "/api/v1/config",
            serde_json::json!({ "indicators": { "rsi_period": -1 } }),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string(), "{body}");
        assert_eq!(body["retryable"], false);
        assert_eq!(state.engine_config(), EngineConfig::default());
    }

    #[tokio::test]
    async fn mistyped_bars_body_is_bad_request_with_envelope() {
        let (app, _) = app();
        let req = post_json(
            "/api/v1/analysis",
            serde_json::json!({ "ticker": "AAPL", "bars": "not a list" }),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid JSON body"), "{body}");
    }

    #[tokio::test]
    async fn oversized_period_is_rejected_and_analysis_still_works() {
        let (app, state) = app();
        let req = post_json(
            "/api/v1/config",
            serde_json::json!({ "indicators": { "rsi_period": u64::MAX } }),
        );
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.engine_config(), EngineConfig::default());

        let req = post_json(
            "/api/v1/analysis",
            serde_json::json!({ "ticker": "AAPL", "bars": bars(&[10.0; 20]) }),
        );
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn failed_config_save_is_internal_error_and_not_installed() {
        let path = std::env::temp_dir()
            .join(format!("ticker-insight-no-dir-{}", std::process::id()))
            .join("runtime_config.json");
        let state = Arc::new(AppState::new(RuntimeConfig::default(), Some(path)).unwrap());
        let app = router(state.clone());

        let mut cfg = serde_json::to_value(EngineConfig::default()).unwrap();
        cfg["indicators"]["rsi_period"] = serde_json::json!(5);
        let (status, body) = send(app, post_json("/api/v1/config", cfg)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["retryable"], false);
        assert_eq!(state.engine_config().indicators.rsi_period, 14);
    }

    #[tokio::test]
    async fn config_roundtrip_and_validation() {
        let (app, state) = app();

        let (status, body) = send(app.clone(), get_req("/api/v1/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["indicators"]["rsi_period"], 14);

        let mut cfg = serde_json::to_value(EngineConfig::default()).unwrap();
        cfg["indicators"]["macd_fast"] = serde_json::json!(30);
        let (status, _) = send(app.clone(), post_json("/api/v1/config", cfg)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.engine_config(), EngineConfig::default());

        let mut cfg = serde_json::to_value(EngineConfig::default()).unwrap();
        cfg["scoring"]["rsi_oversold"] = serde_json::json!(25.0);
        let (status, body) = send(app, post_json("/api/v1/config", cfg)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scoring"]["rsi_oversold"], 25.0);
        assert!((state.engine_config().scoring.rsi_oversold - 25.0).abs() < 1e-10);
    }
}
