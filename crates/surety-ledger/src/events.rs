//! Notifications emitted by the ledger after each committed transition.
//!
//! Events are immutable values. External collaborators (oracle processes,
//! display layers) consume them out-of-band; the ledger never waits on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Address, Amount, FlightKey, StatusCode};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    OperationalChanged {
        operational: bool,
    },
    CallerAuthorized {
        identity: Address,
    },
    CallerRevoked {
        identity: Address,
    },
    AirlineFunded {
        airline: Address,
        amount: Amount,
        total_funds: Amount,
    },
    AirlineVoted {
        candidate: Address,
        sponsor: Address,
        votes: usize,
        required: usize,
    },
    AirlineRegistered {
        airline: Address,
        name: String,
        sponsor: Address,
        registered_count: usize,
    },
    FlightRegistered {
        flight: FlightKey,
    },
    InsurancePurchased {
        passenger: Address,
        flight: FlightKey,
        premium: Amount,
    },
    OracleRegistered {
        oracle: Address,
        indexes: [u8; 3],
    },
    /// A status request is open; oracles holding `index` should respond.
    OracleRequest {
        index: u8,
        flight: FlightKey,
    },
    OracleReport {
        oracle: Address,
        index: u8,
        flight: FlightKey,
        status: StatusCode,
        tally: usize,
    },
    FlightStatusInfo {
        index: u8,
        flight: FlightKey,
        status: StatusCode,
    },
    PassengerCredited {
        passenger: Address,
        flight: FlightKey,
        amount: Amount,
    },
    CreditWithdrawn {
        passenger: Address,
        amount: Amount,
    },
}

impl LedgerEvent {
    /// Short name for logs and event listings.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::OperationalChanged { .. } => "operational_changed",
            LedgerEvent::CallerAuthorized { .. } => "caller_authorized",
            LedgerEvent::CallerRevoked { .. } => "caller_revoked",
            LedgerEvent::AirlineFunded { .. } => "airline_funded",
            LedgerEvent::AirlineVoted { .. } => "airline_voted",
            LedgerEvent::AirlineRegistered { .. } => "airline_registered",
            LedgerEvent::FlightRegistered { .. } => "flight_registered",
            LedgerEvent::InsurancePurchased { .. } => "insurance_purchased",
            LedgerEvent::OracleRegistered { .. } => "oracle_registered",
            LedgerEvent::OracleRequest { .. } => "oracle_request",
            LedgerEvent::OracleReport { .. } => "oracle_report",
            LedgerEvent::FlightStatusInfo { .. } => "flight_status_info",
            LedgerEvent::PassengerCredited { .. } => "passenger_credited",
            LedgerEvent::CreditWithdrawn { .. } => "credit_withdrawn",
        }
    }
}

/// An event stamped with a unique id and commit time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub event: LedgerEvent,
}

impl EventEnvelope {
    pub fn new(event: LedgerEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            event,
        }
    }
}
