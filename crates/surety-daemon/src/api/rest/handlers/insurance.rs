//! Insurance purchase handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use surety_ledger::{Address, Amount, FlightKey, InsurancePolicy};

#[derive(Debug, Deserialize)]
pub struct PurchaseInsuranceRequest {
    pub passenger: Address,
    pub flight: FlightKey,
    pub premium: Amount,
}

pub async fn purchase_insurance(
    State(state): State<AppState>,
    Json(request): Json<PurchaseInsuranceRequest>,
) -> ApiResult<Json<InsurancePolicy>> {
    let policy =
        state
            .ledger
            .purchase_insurance(&request.passenger, &request.flight, request.premium)?;

    tracing::info!(
        passenger = %policy.passenger,
        flight = %policy.flight,
        premium = %policy.premium,
        "Insurance purchased"
    );

    Ok(Json(policy))
}

/// Policy path: `/:passenger/:airline/:code/:departure`
pub async fn get_policy(
    State(state): State<AppState>,
    Path((passenger, airline, code, departure)): Path<(String, String, String, u64)>,
) -> ApiResult<Json<InsurancePolicy>> {
    let passenger = Address::new(passenger);
    let flight = FlightKey::new(Address::new(airline), code, departure);
    state
        .ledger
        .policy(&passenger, &flight)?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("No policy for {} on {}", passenger, flight))
        })
}
