//! Flight Surety daemon library
//!
//! This module provides the service around the ledger:
//! - REST API handlers
//! - Simulated oracle network
//! - Payout log and event history
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod event_log;
pub mod payouts;
pub mod server;
pub mod simulator;

pub use api::rest::state::AppState;
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::{build_state, Server};
pub use simulator::{OracleSimulator, RandomStatus, StatusSource, StatusStrategy};
