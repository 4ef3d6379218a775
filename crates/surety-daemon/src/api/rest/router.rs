//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health and summary
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/summary", get(handlers::summary))
        // Operational switch and allow-list
        .route(
            "/operational",
            get(handlers::get_operational).post(handlers::set_operational),
        )
        .route("/callers", post(handlers::authorize_caller))
        .route("/callers/revoke", post(handlers::revoke_caller))
        // Airlines
        .route(
            "/airlines",
            get(handlers::list_airlines).post(handlers::register_airline),
        )
        .route("/airlines/:address", get(handlers::get_airline))
        .route("/airlines/:address/fund", post(handlers::fund_airline))
        // Flights and status requests
        .route(
            "/flights",
            get(handlers::list_flights).post(handlers::register_flight),
        )
        .route(
            "/flights/:airline/:code/:departure",
            get(handlers::get_flight),
        )
        .route(
            "/flights/:airline/:code/:departure/status",
            post(handlers::request_flight_status),
        )
        .route(
            "/requests/:index/:airline/:code/:departure",
            get(handlers::get_status_request),
        )
        // Insurance
        .route("/insurance", post(handlers::purchase_insurance))
        .route(
            "/insurance/:passenger/:airline/:code/:departure",
            get(handlers::get_policy),
        )
        // Oracles
        .route(
            "/oracles",
            get(handlers::list_oracles).post(handlers::register_oracle),
        )
        .route("/oracles/:address/indexes", get(handlers::get_oracle_indexes))
        .route(
            "/oracles/:address/responses",
            post(handlers::submit_oracle_response),
        )
        // Credit
        .route("/credits/:passenger", get(handlers::get_credit_balance))
        .route("/credits/:passenger/withdraw", post(handlers::withdraw_credit))
        .route("/payouts", get(handlers::list_payouts))
        // Simulated oracle status
        .route(
            "/status",
            get(handlers::get_status_override).delete(handlers::clear_status_override),
        )
        .route("/status/:code", get(handlers::set_status_override))
        // Events
        .route("/events", get(handlers::get_events));

    // Build router with middleware
    let mut router = Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
