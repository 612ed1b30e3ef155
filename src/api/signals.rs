//! Signal API endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::services::now_iso;
use crate::types::{CompaniesPayload, IndicatorSignal, PerformancePayload, SignalKind};
use crate::AppState;

const BASELINE_NOTICE: &str = "Using cached baseline data";

#[derive(Debug, Serialize)]
pub struct AllSignalsResponse {
    pub success: bool,
    pub timestamp: String,
    pub signals: Vec<IndicatorSignal>,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct SignalResponse {
    pub success: bool,
    pub data: IndicatorSignal,
}

#[derive(Debug, Serialize)]
pub struct CompaniesResponse {
    pub success: bool,
    #[serde(flatten)]
    pub payload: CompaniesPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResponse {
    pub success: bool,
    pub data: PerformancePayload,
    pub last_update: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Create the signals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all", get(get_all_signals))
        .route("/companies", get(get_companies))
        .route("/performance", get(get_performance))
        .route("/:slug", get(get_signal))
}

/// All six indicators in dashboard order.
async fn get_all_signals(State(state): State<AppState>) -> Json<AllSignalsResponse> {
    let snapshot = state.signals.all().await;

    Json(AllSignalsResponse {
        success: true,
        timestamp: now_iso(),
        signals: snapshot.signals,
        cached: snapshot.cached,
    })
}

/// One indicator by URL slug.
async fn get_signal(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SignalResponse>> {
    let kind = SignalKind::from_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("Unknown signal: {}", slug)))?;

    Ok(Json(SignalResponse {
        success: true,
        data: state.signals.get(kind).await,
    }))
}

async fn get_companies(State(state): State<AppState>) -> Json<CompaniesResponse> {
    Json(CompaniesResponse {
        success: true,
        payload: state.companies.all().await,
    })
}

/// Indexed portfolio chart. Only an engine contract violation turns into an error status.
async fn get_performance(State(state): State<AppState>) -> Result<Json<PerformanceResponse>> {
    let report = state.performance.chart().await?;
    let last_update = report.payload.metadata.last_updated.clone();

    let (cached, error) = if report.fallback {
        (Some(true), Some(BASELINE_NOTICE))
    } else {
        (None, None)
    };

    Ok(Json(PerformanceResponse {
        success: true,
        data: report.payload,
        last_update,
        cached,
        error,
    }))
}
