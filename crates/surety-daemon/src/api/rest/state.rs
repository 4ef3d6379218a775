//! Application state for API handlers

use crate::event_log::EventLog;
use crate::payouts::PayoutLog;
use crate::simulator::StatusSource;
use std::sync::Arc;
use surety_ledger::FlightSuretyLedger;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The ledger
    pub ledger: Arc<FlightSuretyLedger>,

    /// Status reported by simulated oracles
    pub status: Arc<StatusSource>,

    /// Settled withdrawals
    pub payouts: Arc<PayoutLog>,

    /// Recent ledger notifications
    pub events: Arc<EventLog>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        ledger: Arc<FlightSuretyLedger>,
        status: Arc<StatusSource>,
        payouts: Arc<PayoutLog>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            ledger,
            status,
            payouts,
            events,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
