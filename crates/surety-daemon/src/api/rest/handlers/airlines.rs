//! Airline registry handlers
//!
//! Sponsor and airline addresses are asserted by the client, not authenticated.

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use surety_ledger::{Address, Admission, Airline, Amount};

/// Register airline request
#[derive(Debug, Deserialize)]
pub struct RegisterAirlineRequest {
    pub sponsor: Address,
    pub airline: Address,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FundAirlineRequest {
    pub amount: Amount,
}

/// List admitted airlines and pending candidates
pub async fn list_airlines(State(state): State<AppState>) -> ApiResult<Json<Vec<Airline>>> {
    Ok(Json(state.ledger.airlines()?))
}

pub async fn get_airline(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<Airline>> {
    state
        .ledger
        .airline(&Address::new(address.clone()))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Airline {} not found", address)))
}

/// Sponsor or vote for a candidate
pub async fn register_airline(
    State(state): State<AppState>,
    Json(request): Json<RegisterAirlineRequest>,
) -> ApiResult<Json<Admission>> {
    let admission =
        state
            .ledger
            .register_airline(&request.sponsor, &request.airline, &request.name)?;

    tracing::info!(
        sponsor = %request.sponsor,
        airline = %request.airline,
        registered = admission.is_registered(),
        "Airline sponsorship accepted"
    );

    Ok(Json(admission))
}

pub async fn fund_airline(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<FundAirlineRequest>,
) -> ApiResult<Json<Airline>> {
    let airline = state
        .ledger
        .fund_airline(&Address::new(address), request.amount)?;
    Ok(Json(airline))
}
