use thiserror::Error;

use crate::types::{Address, Amount, FlightKey, StatusRequestKey};

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result alias for storage backends.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors returned by ledger operations.
///
/// Every variant is a definitive rejection of one call. A rejected call leaves
/// no partial effect and may be retried once the triggering condition is fixed.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger is not operational")]
    NotOperational,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("already registered: {0}")]
    AlreadyRegistered(String),

    #[error("passenger {passenger} already insured for flight {flight}")]
    AlreadyInsured { passenger: Address, flight: FlightKey },

    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Amount, reason: String },

    #[error("no credit balance for {0}")]
    NoCreditBalance(Address),

    #[error("status request {0} is already finalized")]
    RequestFinalized(StatusRequestKey),

    #[error("flight not registered: {0}")]
    FlightNotRegistered(FlightKey),

    #[error("no status request opened for {0}")]
    RequestNotFound(StatusRequestKey),

    #[error("transfer to {to} failed: {reason}")]
    TransferFailed { to: Address, reason: String },

    #[error("escrow holds {available}, cannot release {needed}")]
    InsufficientEscrow { needed: Amount, available: Amount },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("amount overflow: {0}")]
    Overflow(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        LedgerError::Unauthorized(reason.into())
    }

    pub fn invalid_amount(amount: Amount, reason: impl Into<String>) -> Self {
        LedgerError::InvalidAmount {
            amount,
            reason: reason.into(),
        }
    }
}

/// Storage-layer errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}
