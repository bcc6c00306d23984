use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::dataset::Frame;
use crate::engine::ScoringEngine;
use crate::risk::RiskCategory;

/// Web UI server - the scorecard dashboard
/// KPI cards, PD/score distributions, risk donut, what-if predictor,
/// scored CSV download
pub struct WebServer {
    engine: Arc<ScoringEngine>,
    config: Arc<Config>,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<ScoringEngine>,
}

#[derive(Deserialize)]
struct RecordsQuery {
    limit: Option<usize>,
    category: Option<String>,
}

#[derive(Deserialize)]
struct BinsQuery {
    bins: Option<usize>,
}

#[derive(Deserialize)]
struct JournalQuery {
    source: Option<String>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct UploadQuery {
    name: Option<String>,
}

impl WebServer {
    pub fn new(engine: Arc<ScoringEngine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }

    pub fn router(engine: Arc<ScoringEngine>) -> Router {
        let state = AppState { engine };

        Router::new()
            .route("/", get(dashboard))
            .route("/api/stats", get(api_stats))
            .route("/api/summary", get(api_summary))
            .route("/api/distribution", get(api_distribution))
            .route("/api/categories", get(api_categories))
            .route("/api/records", get(api_records))
            .route("/api/top-risk", get(api_top_risk))
            .route("/api/schema", get(api_schema))
            .route("/api/theme", get(api_theme))
            .route("/api/journal", get(api_journal))
            .route("/api/download", get(api_download))
            .route("/api/upload", post(api_upload))
            .route("/api/predict", post(api_predict))
            .route("/metrics", get(api_metrics))
            // The BI connector fetches the APIs cross-origin
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        if !self.config.web.enabled {
            info!("Web UI disabled");
            return Ok(());
        }

        let app = Self::router(self.engine.clone());

        let addr = format!("{}:{}", self.config.web.address, self.config.web.port);
        info!("🌐 Scorecard dashboard listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Dashboard HTML - embedded single-page app
async fn dashboard() -> Html<String> {
    Html(include_str!("../../static/dashboard.html").to_string())
}

/// Stats API
async fn api_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.get_stats())
}

/// KPI cards
async fn api_summary(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.engine.current() {
        Some(scored) => Json(serde_json::json!({
            "loaded": true,
            "source": scored.source,
            "kpis": crate::analytics::kpis(&scored),
        })),
        None => Json(serde_json::json!({ "loaded": false })),
    }
}

/// PD and score histograms
async fn api_distribution(
    State(state): State<AppState>,
    Query(params): Query<BinsQuery>,
) -> Json<serde_json::Value> {
    let bins = params.bins.unwrap_or(10).clamp(1, 100);
    match state.engine.current() {
        Some(scored) => Json(serde_json::json!({
            "pd": crate::analytics::histogram(&scored.pd, bins),
            "score": crate::analytics::histogram(&scored.scores, bins),
        })),
        None => Json(serde_json::json!({ "pd": [], "score": [] })),
    }
}

/// Risk tier breakdown (donut source)
async fn api_categories(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.engine.current() {
        Some(scored) => Json(serde_json::json!({
            "categories": crate::analytics::category_counts(&scored),
        })),
        None => Json(serde_json::json!({ "categories": [] })),
    }
}

/// Scored rows (scatter/table source), optional tier filter
async fn api_records(
    State(state): State<AppState>,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let limit = params.limit.unwrap_or(5000);
    let category = match params.category.as_deref() {
        Some(s) => Some(
            parse_category(s).ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Unknown risk category '{}'", s),
                )
            })?,
        ),
        None => None,
    };

    let records = match state.engine.current() {
        Some(scored) => crate::analytics::records(&scored, limit, category),
        None => Vec::new(),
    };
    Ok(Json(serde_json::json!({ "records": records })))
}

/// Riskiest customers, PD descending
async fn api_top_risk(
    State(state): State<AppState>,
    Query(params): Query<RecordsQuery>,
) -> Json<serde_json::Value> {
    let limit = params.limit.unwrap_or(10);
    let records = match state.engine.current() {
        Some(scored) => crate::analytics::top_high_risk(&scored, limit),
        None => Vec::new(),
    };
    Json(serde_json::json!({ "records": records }))
}

/// What-if form schema from the current frame
async fn api_schema(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.engine.current() {
        Some(scored) => Json(serde_json::json!({
            "loaded": true,
            "features": crate::predictor::feature_schema(&scored.frame),
        })),
        None => Json(serde_json::json!({ "loaded": false, "features": [] })),
    }
}

/// Banking theme document
async fn api_theme() -> Json<serde_json::Value> {
    Json(crate::theme::theme_json())
}

/// Scoring-run journal with search
async fn api_journal(
    State(state): State<AppState>,
    Query(params): Query<JournalQuery>,
) -> Json<serde_json::Value> {
    let limit = params.limit.unwrap_or(100);
    let entries = state.engine.journal.search(params.source.as_deref(), limit);
    Json(serde_json::json!({
        "entries": entries,
        "stats": state.engine.journal.get_stats(),
    }))
}

/// Scored dataset as downloadable CSV
async fn api_download(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let scored = state
        .engine
        .current()
        .ok_or((StatusCode::NOT_FOUND, "No dataset uploaded yet".to_string()))?;
    let csv = scored
        .to_csv_string()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"behavior_scorecard_output.csv\"",
            ),
        ],
        csv,
    ))
}

/// Upload a CSV body, score it and make it the current dataset
async fn api_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadQuery>,
    body: String,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let name = params.name.unwrap_or_else(|| "dataset.csv".to_string());
    let source = format!("upload:{}", name);

    let frame =
        Frame::from_csv_str(&body).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let scored = state
        .engine
        .ingest(frame, &source)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(serde_json::json!({
        "source": scored.source,
        "kpis": crate::analytics::kpis(&scored),
    })))
}

/// What-if prediction
async fn api_predict(
    State(state): State<AppState>,
    Json(inputs): Json<BTreeMap<String, serde_json::Value>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let prediction = state
        .engine
        .predict(&inputs)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(serde_json::json!(prediction)))
}

/// Prometheus metrics
async fn api_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::render_metrics(&state.engine),
    )
}

fn parse_category(s: &str) -> Option<RiskCategory> {
    match s.to_ascii_lowercase().as_str() {
        "low" | "low risk" => Some(RiskCategory::Low),
        "medium" | "medium risk" => Some(RiskCategory::Medium),
        "high" | "high risk" => Some(RiskCategory::High),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("low"), Some(RiskCategory::Low));
        assert_eq!(parse_category("High Risk"), Some(RiskCategory::High));
        assert_eq!(parse_category("banana"), None);
    }
}
