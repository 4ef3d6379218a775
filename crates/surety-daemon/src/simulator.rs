//! Simulated oracle network
//!
//! Registers a fixed set of oracles with the ledger and answers every
//! `OracleRequest` notification on behalf of each oracle holding the requested
//! index. Which status an oracle reports is decided by a [`StatusStrategy`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, RwLock};
use surety_ledger::{
    Address, EventEnvelope, FlightKey, FlightSuretyLedger, LedgerError, LedgerEvent,
    LedgerResult, OracleIndexes, StatusCode, SubmissionOutcome,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Decides the status a simulated oracle reports.
pub trait StatusStrategy: Send + Sync {
    fn status_for(&self, oracle: &Address, index: u8, flight: &FlightKey) -> StatusCode;
}

/// Uniformly random status per answer.
pub struct RandomStatus {
    rng: Mutex<StdRng>,
}

impl RandomStatus {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl StatusStrategy for RandomStatus {
    fn status_for(&self, _oracle: &Address, _index: u8, _flight: &FlightKey) -> StatusCode {
        match self.rng.lock() {
            Ok(mut rng) => StatusCode::ALL[rng.gen_range(0..StatusCode::ALL.len())],
            Err(_) => StatusCode::Unknown,
        }
    }
}

/// A manual override in front of a fallback strategy.
///
/// While an override is set every oracle reports it, so requests reach quorum
/// on that status.
pub struct StatusSource {
    manual: RwLock<Option<StatusCode>>,
    fallback: Box<dyn StatusStrategy>,
}

impl StatusSource {
    pub fn new(fallback: impl StatusStrategy + 'static) -> Self {
        Self {
            manual: RwLock::new(None),
            fallback: Box::new(fallback),
        }
    }

    pub fn with_override(self, status: Option<StatusCode>) -> Self {
        self.set_override(status);
        self
    }

    pub fn set_override(&self, status: Option<StatusCode>) {
        if let Ok(mut manual) = self.manual.write() {
            *manual = status;
        }
        match status {
            Some(status) => tracing::info!(status = %status, "Oracle status override set"),
            None => tracing::info!("Oracle status override cleared"),
        }
    }

    pub fn current_override(&self) -> Option<StatusCode> {
        self.manual.read().ok().and_then(|m| *m)
    }
}

impl StatusStrategy for StatusSource {
    fn status_for(&self, oracle: &Address, index: u8, flight: &FlightKey) -> StatusCode {
        self.current_override()
            .unwrap_or_else(|| self.fallback.status_for(oracle, index, flight))
    }
}

/// Simulated oracles registered with one ledger.
pub struct OracleSimulator {
    ledger: Arc<FlightSuretyLedger>,
    oracles: Vec<(Address, OracleIndexes)>,
    strategy: Arc<dyn StatusStrategy>,
}

impl OracleSimulator {
    /// Register `count` oracles, paying the ledger's registration fee for each.
    ///
    /// Oracles registered by an earlier run are reused.
    pub fn bootstrap(
        ledger: Arc<FlightSuretyLedger>,
        count: usize,
        strategy: Arc<dyn StatusStrategy>,
    ) -> LedgerResult<Self> {
        let fee = ledger.config().registration_fee;
        let mut oracles = Vec::with_capacity(count);

        for i in 0..count {
            let address = Address::new(format!("oracle-{:02}", i));
            let indexes = match ledger.register_oracle(&address, fee) {
                Ok(oracle) => oracle.indexes,
                Err(LedgerError::AlreadyRegistered(_)) => ledger.my_indexes(&address)?,
                Err(err) => return Err(err),
            };
            tracing::debug!(oracle = %address, indexes = ?indexes.as_array(), "Simulated oracle ready");
            oracles.push((address, indexes));
        }

        tracing::info!(count = oracles.len(), "Oracle simulator bootstrapped");
        Ok(Self {
            ledger,
            oracles,
            strategy,
        })
    }

    pub fn oracles(&self) -> &[(Address, OracleIndexes)] {
        &self.oracles
    }

    /// Answer one request from every oracle holding `index`.
    ///
    /// Rejected submissions are logged and skipped. Returns the outcomes that
    /// were accepted.
    pub fn respond(&self, index: u8, flight: &FlightKey) -> Vec<SubmissionOutcome> {
        let mut outcomes = Vec::new();

        for (oracle, indexes) in &self.oracles {
            if !indexes.contains(index) {
                continue;
            }

            let status = self.strategy.status_for(oracle, index, flight);
            match self
                .ledger
                .submit_oracle_response(oracle, index, flight, status)
            {
                Ok(outcome) => {
                    tracing::debug!(oracle = %oracle, index, status = %status, ?outcome, "Oracle responded");
                    outcomes.push(outcome);
                }
                Err(err) => {
                    tracing::warn!(oracle = %oracle, index, error = %err, "Oracle response rejected");
                }
            }
        }

        outcomes
    }

    /// Answer requests as they are published.
    ///
    /// The simulator holds the ledger, and with it the sending half of the
    /// channel, so the task runs until its handle is aborted.
    pub fn spawn(self, mut rx: broadcast::Receiver<EventEnvelope>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(EventEnvelope {
                        event: LedgerEvent::OracleRequest { index, flight },
                        ..
                    }) => {
                        tracing::info!(index, flight = %flight, "Oracle request received");
                        self.respond(index, &flight);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Oracle simulator lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
