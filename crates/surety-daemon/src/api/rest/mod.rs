//! REST API over the ledger

pub mod handlers;
pub mod router;
pub mod state;
