//! Passenger insurance policies.

use chrono::Utc;
use tracing::info;

use crate::config::LedgerConfig;
use crate::credit::escrow_plus;
use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::flights::FlightRegistry;
use crate::gate::StoreSession;
use crate::storage::{EscrowStorage, PolicyStorage, Storage};
use crate::types::{Address, Amount, FlightKey, InsurancePolicy};

pub struct InsuranceLedger<'c> {
    config: &'c LedgerConfig,
}

impl<'c> InsuranceLedger<'c> {
    pub fn new(config: &'c LedgerConfig) -> Self {
        Self { config }
    }

    /// Buy a policy on a registered flight, escrowing the premium.
    pub fn purchase(
        &self,
        session: &mut StoreSession<'_>,
        passenger: &Address,
        flight: &FlightKey,
        premium: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<InsurancePolicy> {
        FlightRegistry::require(&**session, flight)?;

        if premium.is_zero() {
            return Err(LedgerError::invalid_amount(premium, "premium must be positive"));
        }
        if premium > self.config.price_limit {
            return Err(LedgerError::invalid_amount(
                premium,
                format!("premium above limit of {}", self.config.price_limit),
            ));
        }
        if session.get_policy(passenger, flight)?.is_some() {
            return Err(LedgerError::AlreadyInsured {
                passenger: passenger.clone(),
                flight: flight.clone(),
            });
        }

        let escrow = escrow_plus(&**session, premium)?;
        let policy = InsurancePolicy {
            passenger: passenger.clone(),
            flight: flight.clone(),
            premium,
            active: true,
            purchased_at: Utc::now(),
        };
        session.insert_policy(policy.clone())?;
        session.set_escrow_balance(escrow)?;

        info!(passenger = %passenger, flight = %flight, premium = %premium, "Insurance purchased");
        events.push(LedgerEvent::InsurancePurchased {
            passenger: passenger.clone(),
            flight: flight.clone(),
            premium,
        });
        Ok(policy)
    }

    pub fn is_insured(
        storage: &dyn Storage,
        passenger: &Address,
        flight: &FlightKey,
    ) -> LedgerResult<bool> {
        Ok(storage.get_policy(passenger, flight)?.is_some())
    }

    /// Policies on `flight` that have not been credited yet.
    pub(crate) fn active_policies(
        storage: &dyn Storage,
        flight: &FlightKey,
    ) -> LedgerResult<Vec<InsurancePolicy>> {
        Ok(storage
            .policies_for_flight(flight)?
            .into_iter()
            .filter(|p| p.active)
            .collect())
    }
}
