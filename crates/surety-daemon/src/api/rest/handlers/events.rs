//! Recent ledger notification handlers

use crate::api::rest::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use surety_ledger::EventEnvelope;

/// Get events query params
#[derive(Debug, Deserialize)]
pub struct GetEventsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Event kind, e.g. `passenger_credited`
    pub kind: Option<String>,
}

fn default_limit() -> usize {
    20
}

/// Get recent events
pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<GetEventsQuery>,
) -> Json<Vec<EventEnvelope>> {
    Json(state.events.recent(query.limit, query.kind.as_deref()))
}
