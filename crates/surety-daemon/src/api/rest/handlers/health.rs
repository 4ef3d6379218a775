//! Health and summary handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use serde::Serialize;
use surety_ledger::LedgerSummary;

/// API banner
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: String,
}

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "An API for use with your Dapp!".to_string(),
    })
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Daemon and ledger summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub ledger: LedgerSummary,
    pub payouts: usize,
}

pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<SummaryResponse>> {
    let ledger = state.ledger.summary()?;

    Ok(Json(SummaryResponse {
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        ledger,
        payouts: state.payouts.recent(usize::MAX).len(),
    }))
}
