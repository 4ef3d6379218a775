//! Flight Surety Ledger - flight delay insurance with oracle consensus
//!
//! The ledger admits airlines by funded-sponsor voting, sells capped
//! per-passenger policies on registered flights, settles flight status through
//! a quorum of oracles, and pays insured passengers through pull-payment
//! credits.
//!
//! State lives in a gated [`gate::DataLayer`]; only the ledger's own identity
//! may mutate it, and only while the ledger is operational. Every transition
//! publishes [`LedgerEvent`]s after it commits.

#![deny(unsafe_code)]

pub mod airlines;
pub mod config;
pub mod credit;
pub mod error;
pub mod events;
pub mod flights;
pub mod gate;
pub mod insurance;
pub mod ledger;
pub mod oracles;
pub mod storage;
pub mod types;

pub use airlines::Admission;
pub use config::{LedgerConfig, ETHER};
pub use credit::{FundsTransfer, RecordingTransfer};
pub use error::{LedgerError, LedgerResult, StorageError, StorageResult};
pub use events::{EventEnvelope, LedgerEvent};
pub use ledger::{FlightSuretyLedger, LedgerBuilder, LedgerSummary};
pub use oracles::{
    FixedIndexSelector, IgnoreReason, IndexSelector, Payout, SeededIndexSelector,
    SubmissionOutcome,
};
pub use storage::{InMemoryStorage, Storage};
pub use types::{
    Address, Airline, Amount, Flight, FlightKey, InsurancePolicy, Oracle, OracleIndexes,
    RequestState, StatusCode, StatusRequest, StatusRequestKey,
};
