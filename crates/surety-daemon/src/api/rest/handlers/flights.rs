//! Flight registry and status request handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use surety_ledger::{Address, Flight, FlightKey, StatusRequest, StatusRequestKey};

/// Flight key as path segments: `/:airline/:code/:departure`
#[derive(Debug, Deserialize)]
pub struct FlightPath {
    pub airline: String,
    pub code: String,
    pub departure: u64,
}

impl From<FlightPath> for FlightKey {
    fn from(path: FlightPath) -> Self {
        FlightKey::new(Address::new(path.airline), path.code, path.departure)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterFlightRequest {
    pub airline: Address,
    pub code: String,
    pub departure: u64,
}

pub async fn list_flights(State(state): State<AppState>) -> ApiResult<Json<Vec<Flight>>> {
    Ok(Json(state.ledger.flights()?))
}

pub async fn register_flight(
    State(state): State<AppState>,
    Json(request): Json<RegisterFlightRequest>,
) -> ApiResult<Json<Flight>> {
    let flight = state
        .ledger
        .register_flight(&request.airline, &request.code, request.departure)?;

    tracing::info!(flight = %flight.key, "Registered flight");

    Ok(Json(flight))
}

pub async fn get_flight(
    State(state): State<AppState>,
    Path(path): Path<FlightPath>,
) -> ApiResult<Json<Flight>> {
    let key = FlightKey::from(path);
    state
        .ledger
        .flight(&key)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Flight {} not found", key)))
}

/// Open (or reuse) a status request; simulated oracles pick it up from the
/// published notification.
pub async fn request_flight_status(
    State(state): State<AppState>,
    Path(path): Path<FlightPath>,
) -> ApiResult<Json<StatusRequest>> {
    let key = FlightKey::from(path);
    let request = state.ledger.request_flight_status(&key)?;

    tracing::info!(request = %request.key, "Flight status requested");

    Ok(Json(request))
}

/// Status request key as path segments: `/:index/:airline/:code/:departure`
#[derive(Debug, Deserialize)]
pub struct StatusRequestPath {
    pub index: u8,
    pub airline: String,
    pub code: String,
    pub departure: u64,
}

pub async fn get_status_request(
    State(state): State<AppState>,
    Path(path): Path<StatusRequestPath>,
) -> ApiResult<Json<StatusRequest>> {
    let key = StatusRequestKey {
        index: path.index,
        flight: FlightKey::new(Address::new(path.airline), path.code, path.departure),
    };
    state
        .ledger
        .status_request(&key)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Status request {} not found", key)))
}
