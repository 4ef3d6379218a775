//! Airline registry: funding gate and vote-based admission.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::credit::escrow_plus;
use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::gate::StoreSession;
use crate::storage::{AirlineStorage, EscrowStorage, Storage};
use crate::types::{Address, Airline, Amount};

/// Outcome of a sponsorship.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Admission {
    /// The candidate is now registered.
    Registered { registered_count: usize },
    /// The sponsor's vote is recorded; more distinct sponsors are needed.
    Pending { votes: usize, required: usize },
}

impl Admission {
    pub fn is_registered(&self) -> bool {
        matches!(self, Admission::Registered { .. })
    }
}

/// Airline admission rules.
///
/// Below `consensus_threshold` registered airlines, one funded sponsor admits a
/// candidate. From the threshold on, a candidate needs votes from
/// `ceil(registered / 2)` distinct funded sponsors, recomputed on every call.
pub struct AirlineRegistry<'c> {
    config: &'c LedgerConfig,
}

impl<'c> AirlineRegistry<'c> {
    pub fn new(config: &'c LedgerConfig) -> Self {
        Self { config }
    }

    /// Seed the genesis airline. Used once when the ledger is built.
    ///
    /// A non-zero `funds` deposit is escrowed and marks the airline funded.
    pub(crate) fn seed_genesis(
        storage: &mut dyn Storage,
        address: Address,
        name: String,
        funds: Amount,
    ) -> LedgerResult<()> {
        let escrow = escrow_plus(storage, funds)?;
        let mut airline = Airline::candidate(address, name);
        airline.registered = true;
        airline.funded = !funds.is_zero();
        airline.funds = funds;
        airline.registered_at = Some(Utc::now());
        storage.upsert_airline(airline)?;
        storage.set_escrow_balance(escrow)?;
        Ok(())
    }

    /// Escrow `amount` as funding for a registered airline.
    pub fn fund(
        &self,
        session: &mut StoreSession<'_>,
        airline: &Address,
        amount: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<Airline> {
        if amount < self.config.minimum_funds {
            return Err(LedgerError::invalid_amount(
                amount,
                format!("funding below minimum of {}", self.config.minimum_funds),
            ));
        }

        let mut record = session
            .get_airline(airline)?
            .filter(|a| a.registered)
            .ok_or_else(|| {
                LedgerError::unauthorized(format!("{} is not a registered airline", airline))
            })?;

        let total_funds = record
            .funds
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("funds of {}", airline)))?;
        let escrow = escrow_plus(&**session, amount)?;

        record.funds = total_funds;
        record.funded = true;
        session.upsert_airline(record.clone())?;
        session.set_escrow_balance(escrow)?;

        info!(airline = %airline, amount = %amount, total = %total_funds, "Airline funded");
        events.push(LedgerEvent::AirlineFunded {
            airline: airline.clone(),
            amount,
            total_funds,
        });
        Ok(record)
    }

    /// Sponsor `candidate` for admission.
    pub fn register(
        &self,
        session: &mut StoreSession<'_>,
        sponsor: &Address,
        candidate: &Address,
        name: &str,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<Admission> {
        session
            .get_airline(sponsor)?
            .filter(|a| a.registered && a.funded)
            .ok_or_else(|| {
                LedgerError::unauthorized(format!("{} is not a funded airline", sponsor))
            })?;

        let mut record = match session.get_airline(candidate)? {
            Some(existing) if existing.registered => {
                return Err(LedgerError::AlreadyRegistered(format!(
                    "airline {}",
                    candidate
                )));
            }
            Some(existing) => existing,
            None => Airline::candidate(candidate.clone(), name),
        };

        let registered = session.registered_airline_count()?;

        if self.config.requires_consensus(registered) {
            let required = self.config.votes_required(registered);
            let fresh_vote = record.votes.insert(sponsor.clone());

            if record.votes.len() < required {
                let votes = record.votes.len();
                session.upsert_airline(record)?;

                if fresh_vote {
                    debug!(candidate = %candidate, sponsor = %sponsor, votes, required, "Admission vote recorded");
                    events.push(LedgerEvent::AirlineVoted {
                        candidate: candidate.clone(),
                        sponsor: sponsor.clone(),
                        votes,
                        required,
                    });
                } else {
                    debug!(candidate = %candidate, sponsor = %sponsor, "Repeated vote ignored");
                }
                return Ok(Admission::Pending { votes, required });
            }
        }

        record.registered = true;
        record.votes.clear();
        record.registered_at = Some(Utc::now());
        let name = record.name.clone();
        session.upsert_airline(record)?;

        let registered_count = registered + 1;
        info!(airline = %candidate, sponsor = %sponsor, registered_count, "Airline registered");
        events.push(LedgerEvent::AirlineRegistered {
            airline: candidate.clone(),
            name,
            sponsor: sponsor.clone(),
            registered_count,
        });
        Ok(Admission::Registered { registered_count })
    }

    pub fn is_registered(storage: &dyn Storage, address: &Address) -> LedgerResult<bool> {
        Ok(storage
            .get_airline(address)?
            .map(|a| a.registered)
            .unwrap_or(false))
    }

    pub fn is_funded(storage: &dyn Storage, address: &Address) -> LedgerResult<bool> {
        Ok(storage
            .get_airline(address)?
            .map(|a| a.funded)
            .unwrap_or(false))
    }
}
