//! Operational switch and caller allow-list handlers
//!
//! `caller` is taken from the request body unchecked; see the API module notes
//! on authentication.

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use surety_ledger::Address;

#[derive(Debug, Serialize)]
pub struct OperationalResponse {
    pub operational: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetOperationalRequest {
    pub caller: Address,
    pub operational: bool,
}

pub async fn get_operational(State(state): State<AppState>) -> ApiResult<Json<OperationalResponse>> {
    Ok(Json(OperationalResponse {
        operational: state.ledger.is_operational()?,
    }))
}

/// Only the owner may flip the switch
pub async fn set_operational(
    State(state): State<AppState>,
    Json(request): Json<SetOperationalRequest>,
) -> ApiResult<Json<OperationalResponse>> {
    let operational = state
        .ledger
        .set_operational(&request.caller, request.operational)?;

    tracing::info!(caller = %request.caller, operational, "Operational mode set");

    Ok(Json(OperationalResponse { operational }))
}

#[derive(Debug, Deserialize)]
pub struct CallerRequest {
    pub caller: Address,
    pub identity: Address,
}

#[derive(Debug, Serialize)]
pub struct CallerResponse {
    pub identity: Address,
    pub changed: bool,
}

pub async fn authorize_caller(
    State(state): State<AppState>,
    Json(request): Json<CallerRequest>,
) -> ApiResult<Json<CallerResponse>> {
    let changed = state
        .ledger
        .authorize_caller(&request.caller, request.identity.clone())?;

    Ok(Json(CallerResponse {
        identity: request.identity,
        changed,
    }))
}

pub async fn revoke_caller(
    State(state): State<AppState>,
    Json(request): Json<CallerRequest>,
) -> ApiResult<Json<CallerResponse>> {
    let changed = state
        .ledger
        .revoke_caller(&request.caller, &request.identity)?;

    Ok(Json(CallerResponse {
        identity: request.identity,
        changed,
    }))
}
