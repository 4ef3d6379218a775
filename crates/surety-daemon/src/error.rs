//! Error types for the surety daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use surety_ledger::LedgerError;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Ledger construction or bootstrap error
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rejected by the ledger
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Ledger(err) => match err {
                LedgerError::NotOperational => (StatusCode::SERVICE_UNAVAILABLE, "NOT_OPERATIONAL"),
                LedgerError::Unauthorized(_) => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
                LedgerError::AlreadyRegistered(_) => (StatusCode::CONFLICT, "ALREADY_REGISTERED"),
                LedgerError::AlreadyInsured { .. } => (StatusCode::CONFLICT, "ALREADY_INSURED"),
                LedgerError::RequestFinalized(_) => (StatusCode::CONFLICT, "REQUEST_FINALIZED"),
                LedgerError::NoCreditBalance(_) => (StatusCode::CONFLICT, "NO_CREDIT_BALANCE"),
                LedgerError::InsufficientEscrow { .. } => {
                    (StatusCode::CONFLICT, "INSUFFICIENT_ESCROW")
                }
                LedgerError::InvalidAmount { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_AMOUNT")
                }
                LedgerError::Overflow(_) => (StatusCode::UNPROCESSABLE_ENTITY, "OVERFLOW"),
                LedgerError::FlightNotRegistered(_) => {
                    (StatusCode::NOT_FOUND, "FLIGHT_NOT_REGISTERED")
                }
                LedgerError::RequestNotFound(_) => (StatusCode::NOT_FOUND, "REQUEST_NOT_FOUND"),
                LedgerError::TransferFailed { .. } => (StatusCode::BAD_GATEWAY, "TRANSFER_FAILED"),
                LedgerError::InvalidConfig(_)
                | LedgerError::Storage(_)
                | LedgerError::LockPoisoned => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
