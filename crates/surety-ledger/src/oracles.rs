//! Oracle registration and quorum-based flight status consensus.
//!
//! A status request is keyed by `(index, flight)`. Only oracles holding the
//! request's index may answer it, each at most once. When `quorum` oracles
//! agree on a status the request finalizes, the flight status is recorded,
//! and a late-airline outcome credits every active policy on the flight.
//! Each policy is credited at most once no matter how many requests finalize.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::credit::{escrow_plus, CreditLedger};
use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::flights::FlightRegistry;
use crate::gate::StoreSession;
use crate::insurance::InsuranceLedger;
use crate::storage::Storage;
use crate::types::{
    Address, Amount, FlightKey, Oracle, OracleIndexes, RequestState, StatusCode, StatusRequest,
    StatusRequestKey,
};

/// Source of oracle and request indexes.
pub trait IndexSelector: Send + Sync {
    /// Three distinct indexes drawn from `0..space`.
    fn select_indexes(&mut self, space: u8) -> OracleIndexes;

    /// One index drawn from `0..space`.
    fn select_index(&mut self, space: u8) -> u8;
}

/// Pseudo-random selector backed by a seedable RNG.
pub struct SeededIndexSelector {
    rng: StdRng,
}

impl SeededIndexSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl IndexSelector for SeededIndexSelector {
    fn select_indexes(&mut self, space: u8) -> OracleIndexes {
        let picked = rand::seq::index::sample(&mut self.rng, space as usize, 3);
        let mut indexes = [0u8; 3];
        for (slot, index) in indexes.iter_mut().zip(picked.iter()) {
            *slot = index as u8;
        }
        OracleIndexes(indexes)
    }

    fn select_index(&mut self, space: u8) -> u8 {
        use rand::Rng;
        self.rng.gen_range(0..space)
    }
}

/// Selector that always hands out the same indexes.
#[derive(Clone, Debug)]
pub struct FixedIndexSelector {
    indexes: [u8; 3],
    request_index: u8,
}

impl FixedIndexSelector {
    pub fn new(indexes: [u8; 3], request_index: u8) -> Self {
        Self {
            indexes,
            request_index,
        }
    }
}

impl IndexSelector for FixedIndexSelector {
    fn select_indexes(&mut self, _space: u8) -> OracleIndexes {
        OracleIndexes(self.indexes)
    }

    fn select_index(&mut self, _space: u8) -> u8 {
        self.request_index
    }
}

/// A passenger credit produced by a finalized late-airline request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub passenger: Address,
    pub amount: Amount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    AlreadyFinalized,
    DuplicateResponse,
}

/// Result of an accepted oracle submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// Vote recorded; quorum not reached yet.
    Recorded { status: StatusCode, tally: usize },
    /// This vote reached quorum.
    Finalized {
        status: StatusCode,
        credited: Vec<Payout>,
    },
    /// Late or repeated submission; nothing changed.
    Ignored { reason: IgnoreReason },
}

pub struct OracleConsensus<'c> {
    config: &'c LedgerConfig,
}

impl<'c> OracleConsensus<'c> {
    pub fn new(config: &'c LedgerConfig) -> Self {
        Self { config }
    }

    /// Register an oracle against the registration fee.
    pub fn register(
        &self,
        session: &mut StoreSession<'_>,
        selector: &mut dyn IndexSelector,
        address: &Address,
        fee: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<Oracle> {
        if fee < self.config.registration_fee {
            return Err(LedgerError::invalid_amount(
                fee,
                format!("registration fee is {}", self.config.registration_fee),
            ));
        }
        if session.get_oracle(address)?.is_some() {
            return Err(LedgerError::AlreadyRegistered(format!("oracle {}", address)));
        }

        let escrow = escrow_plus(&**session, fee)?;
        let oracle = Oracle {
            address: address.clone(),
            indexes: selector.select_indexes(self.config.index_space),
            fee,
            registered_at: Utc::now(),
        };
        session.insert_oracle(oracle.clone())?;
        session.set_escrow_balance(escrow)?;

        info!(oracle = %address, indexes = ?oracle.indexes.as_array(), "Oracle registered");
        events.push(LedgerEvent::OracleRegistered {
            oracle: address.clone(),
            indexes: oracle.indexes.as_array(),
        });
        Ok(oracle)
    }

    pub fn indexes_of(storage: &dyn Storage, oracle: &Address) -> LedgerResult<OracleIndexes> {
        storage
            .get_oracle(oracle)?
            .map(|o| o.indexes)
            .ok_or_else(|| LedgerError::unauthorized(format!("{} is not a registered oracle", oracle)))
    }

    /// Open (or reuse) a status request for a registered flight.
    ///
    /// An `OracleRequest` notification is emitted only while the request is open.
    pub fn request_status(
        &self,
        session: &mut StoreSession<'_>,
        selector: &mut dyn IndexSelector,
        flight: &FlightKey,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<StatusRequest> {
        FlightRegistry::require(&**session, flight)?;

        let key = StatusRequestKey {
            index: selector.select_index(self.config.index_space),
            flight: flight.clone(),
        };

        let request = match session.get_request(&key)? {
            Some(existing) => existing,
            None => {
                let request = StatusRequest::open(key.clone());
                session.upsert_request(request.clone())?;
                request
            }
        };

        if request.is_finalized() {
            debug!(request = %key, "Status request already finalized");
        } else {
            info!(request = %key, "Flight status requested");
            events.push(LedgerEvent::OracleRequest {
                index: key.index,
                flight: flight.clone(),
            });
        }
        Ok(request)
    }

    /// Record an oracle's answer to an open request.
    pub fn submit(
        &self,
        session: &mut StoreSession<'_>,
        oracle: &Address,
        index: u8,
        flight: &FlightKey,
        status: StatusCode,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<SubmissionOutcome> {
        let indexes = Self::indexes_of(&**session, oracle)?;
        if !indexes.contains(index) {
            warn!(oracle = %oracle, index, "Oracle answered an index it does not hold");
            return Err(LedgerError::unauthorized(format!(
                "oracle {} does not hold index {}",
                oracle, index
            )));
        }

        let key = StatusRequestKey {
            index,
            flight: flight.clone(),
        };
        let mut request = session
            .get_request(&key)?
            .ok_or_else(|| LedgerError::RequestNotFound(key.clone()))?;

        if request.is_finalized() {
            debug!(request = %key, oracle = %oracle, "Late response ignored");
            return Ok(SubmissionOutcome::Ignored {
                reason: IgnoreReason::AlreadyFinalized,
            });
        }
        if request.has_responded(oracle) {
            debug!(request = %key, oracle = %oracle, "Repeated response ignored");
            return Ok(SubmissionOutcome::Ignored {
                reason: IgnoreReason::DuplicateResponse,
            });
        }

        request
            .responses
            .entry(status)
            .or_default()
            .insert(oracle.clone());
        let tally = request.tally(status);

        let report = LedgerEvent::OracleReport {
            oracle: oracle.clone(),
            index,
            flight: flight.clone(),
            status,
            tally,
        };

        if tally < self.config.quorum {
            session.upsert_request(request)?;
            debug!(request = %key, oracle = %oracle, status = %status, tally, "Oracle response recorded");
            events.push(report);
            return Ok(SubmissionOutcome::Recorded { status, tally });
        }

        let credited = self.finalize(session, request, status, report, events)?;
        Ok(SubmissionOutcome::Finalized { status, credited })
    }

    /// Close a request at quorum and settle the flight.
    ///
    /// Every payout is computed before anything is written.
    fn finalize(
        &self,
        session: &mut StoreSession<'_>,
        mut request: StatusRequest,
        status: StatusCode,
        report: LedgerEvent,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<Vec<Payout>> {
        let key = request.key.clone();
        let mut flight = FlightRegistry::require(&**session, &key.flight)?;

        let mut settlements = Vec::new();
        if status.triggers_payout() {
            for policy in InsuranceLedger::active_policies(&**session, &key.flight)? {
                let amount = policy
                    .premium
                    .checked_percent(self.config.payout_percent)
                    .ok_or_else(|| LedgerError::Overflow(format!("payout for {}", policy.passenger)))?;
                CreditLedger::balance_after_credit(&**session, &policy.passenger, amount)?;
                settlements.push((policy, amount));
            }
        }

        request.state = RequestState::Finalized { status };
        session.upsert_request(request)?;
        flight.status = status;
        session.update_flight(flight)?;

        events.push(report);
        info!(request = %key, status = %status, "Flight status finalized");
        events.push(LedgerEvent::FlightStatusInfo {
            index: key.index,
            flight: key.flight.clone(),
            status,
        });

        let mut credited = Vec::with_capacity(settlements.len());
        for (mut policy, amount) in settlements {
            CreditLedger::credit(session, &policy.passenger, amount)?;
            policy.active = false;
            let passenger = policy.passenger.clone();
            session.update_policy(policy)?;

            events.push(LedgerEvent::PassengerCredited {
                passenger: passenger.clone(),
                flight: key.flight.clone(),
                amount,
            });
            credited.push(Payout { passenger, amount });
        }

        if !credited.is_empty() {
            info!(flight = %key.flight, policies = credited.len(), "Insurees credited");
        }
        Ok(credited)
    }
}
