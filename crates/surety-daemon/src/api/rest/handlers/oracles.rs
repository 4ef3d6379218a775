//! Oracle registration and response handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use surety_ledger::{Address, Amount, FlightKey, Oracle, OracleIndexes, StatusCode, SubmissionOutcome};

#[derive(Debug, Deserialize)]
pub struct RegisterOracleRequest {
    pub oracle: Address,
    pub fee: Amount,
}

/// Oracle response; `status` is the numeric wire code
#[derive(Debug, Deserialize)]
pub struct SubmitResponseRequest {
    pub index: u8,
    pub flight: FlightKey,
    pub status: u8,
}

pub async fn list_oracles(State(state): State<AppState>) -> ApiResult<Json<Vec<Oracle>>> {
    Ok(Json(state.ledger.oracles()?))
}

pub async fn register_oracle(
    State(state): State<AppState>,
    Json(request): Json<RegisterOracleRequest>,
) -> ApiResult<Json<Oracle>> {
    let oracle = state.ledger.register_oracle(&request.oracle, request.fee)?;
    Ok(Json(oracle))
}

pub async fn get_oracle_indexes(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<OracleIndexes>> {
    Ok(Json(state.ledger.my_indexes(&Address::new(address))?))
}

pub async fn submit_oracle_response(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<SubmitResponseRequest>,
) -> ApiResult<Json<SubmissionOutcome>> {
    let status = StatusCode::try_from(request.status).map_err(ApiError::BadRequest)?;
    let outcome = state.ledger.submit_oracle_response(
        &Address::new(address),
        request.index,
        &request.flight,
        status,
    )?;
    Ok(Json(outcome))
}
