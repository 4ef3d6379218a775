//! Passenger credit and payout handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use crate::payouts::PayoutRecord;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use surety_ledger::{Address, Amount};

#[derive(Debug, Serialize)]
pub struct CreditBalanceResponse {
    pub passenger: Address,
    pub balance: Amount,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub passenger: Address,
    pub amount: Amount,
}

pub async fn get_credit_balance(
    State(state): State<AppState>,
    Path(passenger): Path<String>,
) -> ApiResult<Json<CreditBalanceResponse>> {
    let passenger = Address::new(passenger);
    let balance = state.ledger.credit_balance_of(&passenger)?;
    Ok(Json(CreditBalanceResponse { passenger, balance }))
}

/// Pay out the passenger's whole balance through the payout log
pub async fn withdraw_credit(
    State(state): State<AppState>,
    Path(passenger): Path<String>,
) -> ApiResult<Json<WithdrawResponse>> {
    let passenger = Address::new(passenger);
    let amount = state.ledger.withdraw(&passenger)?;

    tracing::info!(passenger = %passenger, amount = %amount, "Credit withdrawn");

    Ok(Json(WithdrawResponse { passenger, amount }))
}

#[derive(Debug, Deserialize)]
pub struct GetPayoutsQuery {
    #[serde(default = "default_payout_limit")]
    pub limit: usize,
    pub passenger: Option<String>,
}

fn default_payout_limit() -> usize {
    50
}

/// Settled payouts, most recent first
pub async fn list_payouts(
    State(state): State<AppState>,
    Query(query): Query<GetPayoutsQuery>,
) -> ApiResult<Json<Vec<PayoutRecord>>> {
    let payouts = match query.passenger {
        Some(passenger) => {
            let mut records = state.payouts.for_passenger(&Address::new(passenger));
            records.reverse();
            records.truncate(query.limit);
            records
        }
        None => state.payouts.recent(query.limit),
    };
    Ok(Json(payouts))
}
