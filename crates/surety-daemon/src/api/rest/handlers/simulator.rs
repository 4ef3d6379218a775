//! Manual status override for the simulated oracles

use crate::api::rest::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use surety_ledger::StatusCode;

#[derive(Debug, Serialize)]
pub struct StatusOverrideResponse {
    pub message: String,
    #[serde(rename = "override")]
    pub status: Option<StatusCode>,
}

pub async fn get_status_override(State(state): State<AppState>) -> Json<StatusOverrideResponse> {
    let status = state.status.current_override();
    let message = match status {
        Some(status) => format!("Status is: {}", status),
        None => "Status is random".to_string(),
    };
    Json(StatusOverrideResponse { message, status })
}

/// Pin every simulated oracle to one status. Unrecognised codes select UNKNOWN.
pub async fn set_status_override(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<StatusOverrideResponse> {
    let status = code
        .parse::<u8>()
        .ok()
        .and_then(|code| StatusCode::try_from(code).ok())
        .unwrap_or(StatusCode::Unknown);

    state.status.set_override(Some(status));

    Json(StatusOverrideResponse {
        message: format!("Status changed to: {}", status),
        status: Some(status),
    })
}

/// Return to random statuses
pub async fn clear_status_override(State(state): State<AppState>) -> Json<StatusOverrideResponse> {
    state.status.set_override(None);
    Json(StatusOverrideResponse {
        message: "Status is random".to_string(),
        status: None,
    })
}
