//! The ledger facade.
//!
//! All state lives in one [`DataLayer`] behind one `RwLock`. Every mutation
//! takes the write lock for the whole transition, opens a gated session under
//! the ledger's own identity, and publishes its notifications only after the
//! transition committed. Reads take the read lock and are never gated.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::airlines::{Admission, AirlineRegistry};
use crate::config::LedgerConfig;
use crate::credit::{CreditLedger, FundsTransfer, RecordingTransfer};
use crate::error::{LedgerError, LedgerResult};
use crate::events::{EventEnvelope, LedgerEvent};
use crate::flights::FlightRegistry;
use crate::gate::{DataLayer, StoreSession};
use crate::insurance::InsuranceLedger;
use crate::oracles::{IndexSelector, OracleConsensus, SeededIndexSelector, SubmissionOutcome};
use crate::storage::{InMemoryStorage, Storage};
use crate::types::{
    Address, Airline, Amount, Flight, FlightKey, InsurancePolicy, Oracle, OracleIndexes,
    StatusCode, StatusRequest, StatusRequestKey,
};

const DEFAULT_EVENT_CAPACITY: usize = 1024;

struct LedgerCore {
    data: DataLayer,
    selector: Box<dyn IndexSelector>,
}

/// Counts and balances for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub operational: bool,
    pub registered_airlines: usize,
    pub funded_airlines: usize,
    pub pending_airlines: usize,
    pub flights: usize,
    pub oracles: usize,
    pub escrow: Amount,
}

/// Flight delay insurance ledger.
pub struct FlightSuretyLedger {
    core: RwLock<LedgerCore>,
    identity: Address,
    config: LedgerConfig,
    transfer: Arc<dyn FundsTransfer>,
    events: broadcast::Sender<EventEnvelope>,
}

impl FlightSuretyLedger {
    pub fn builder(owner: Address, genesis_airline: Address) -> LedgerBuilder {
        LedgerBuilder::new(owner, genesis_airline)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Identity this ledger presents to its own data layer.
    pub fn identity(&self) -> &Address {
        &self.identity
    }

    /// Subscribe to committed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    // Access gate

    pub fn is_operational(&self) -> LedgerResult<bool> {
        Ok(self.read()?.data.gate().is_operational())
    }

    pub fn is_authorized(&self, identity: &Address) -> LedgerResult<bool> {
        Ok(self.read()?.data.gate().is_authorized(identity))
    }

    pub fn owner(&self) -> LedgerResult<Address> {
        Ok(self.read()?.data.gate().owner().clone())
    }

    pub fn set_operational(&self, caller: &Address, mode: bool) -> LedgerResult<bool> {
        let mut core = self.write()?;
        let before = core.data.gate().is_operational();
        let mode = core.data.gate_mut().set_operational(caller, mode)?;
        if before != mode {
            self.publish(&core, vec![LedgerEvent::OperationalChanged { operational: mode }]);
        }
        Ok(mode)
    }

    pub fn authorize_caller(&self, caller: &Address, identity: Address) -> LedgerResult<bool> {
        let mut core = self.write()?;
        let added = core.data.gate_mut().authorize(caller, identity.clone())?;
        if added {
            self.publish(&core, vec![LedgerEvent::CallerAuthorized { identity }]);
        }
        Ok(added)
    }

    pub fn revoke_caller(&self, caller: &Address, identity: &Address) -> LedgerResult<bool> {
        let mut core = self.write()?;
        let removed = core.data.gate_mut().revoke(caller, identity)?;
        if removed {
            self.publish(
                &core,
                vec![LedgerEvent::CallerRevoked {
                    identity: identity.clone(),
                }],
            );
        }
        Ok(removed)
    }

    // Airlines

    pub fn fund_airline(&self, airline: &Address, amount: Amount) -> LedgerResult<Airline> {
        let registry = AirlineRegistry::new(&self.config);
        self.mutate(|session, _, events| registry.fund(session, airline, amount, events))
    }

    pub fn register_airline(
        &self,
        sponsor: &Address,
        candidate: &Address,
        name: &str,
    ) -> LedgerResult<Admission> {
        let registry = AirlineRegistry::new(&self.config);
        self.mutate(|session, _, events| {
            registry.register(session, sponsor, candidate, name, events)
        })
    }

    pub fn is_airline_registered(&self, airline: &Address) -> LedgerResult<bool> {
        AirlineRegistry::is_registered(self.read_operational()?.data.storage(), airline)
    }

    pub fn is_airline_funded(&self, airline: &Address) -> LedgerResult<bool> {
        AirlineRegistry::is_funded(self.read_operational()?.data.storage(), airline)
    }

    pub fn airline(&self, airline: &Address) -> LedgerResult<Option<Airline>> {
        Ok(self.read()?.data.storage().get_airline(airline)?)
    }

    pub fn airlines(&self) -> LedgerResult<Vec<Airline>> {
        Ok(self.read()?.data.storage().list_airlines()?)
    }

    pub fn registered_airline_count(&self) -> LedgerResult<usize> {
        Ok(self.read()?.data.storage().registered_airline_count()?)
    }

    // Flights

    pub fn register_flight(
        &self,
        airline: &Address,
        code: &str,
        departure: u64,
    ) -> LedgerResult<Flight> {
        self.mutate(|session, _, events| {
            FlightRegistry::register(session, airline, code, departure, events)
        })
    }

    pub fn is_flight_registered(&self, flight: &FlightKey) -> LedgerResult<bool> {
        FlightRegistry::is_registered(self.read_operational()?.data.storage(), flight)
    }

    pub fn flight(&self, flight: &FlightKey) -> LedgerResult<Option<Flight>> {
        Ok(self.read()?.data.storage().get_flight(flight)?)
    }

    pub fn flights(&self) -> LedgerResult<Vec<Flight>> {
        Ok(self.read()?.data.storage().list_flights()?)
    }

    // Insurance

    pub fn purchase_insurance(
        &self,
        passenger: &Address,
        flight: &FlightKey,
        premium: Amount,
    ) -> LedgerResult<InsurancePolicy> {
        let insurance = InsuranceLedger::new(&self.config);
        self.mutate(|session, _, events| {
            insurance.purchase(session, passenger, flight, premium, events)
        })
    }

    pub fn is_passenger_insured(
        &self,
        passenger: &Address,
        flight: &FlightKey,
    ) -> LedgerResult<bool> {
        InsuranceLedger::is_insured(self.read_operational()?.data.storage(), passenger, flight)
    }

    pub fn policy(
        &self,
        passenger: &Address,
        flight: &FlightKey,
    ) -> LedgerResult<Option<InsurancePolicy>> {
        Ok(self.read()?.data.storage().get_policy(passenger, flight)?)
    }

    // Oracles

    pub fn register_oracle(&self, oracle: &Address, fee: Amount) -> LedgerResult<Oracle> {
        let consensus = OracleConsensus::new(&self.config);
        self.mutate(|session, selector, events| {
            consensus.register(session, selector, oracle, fee, events)
        })
    }

    pub fn my_indexes(&self, oracle: &Address) -> LedgerResult<OracleIndexes> {
        OracleConsensus::indexes_of(self.read()?.data.storage(), oracle)
    }

    pub fn oracles(&self) -> LedgerResult<Vec<Oracle>> {
        Ok(self.read()?.data.storage().list_oracles()?)
    }

    /// Ask oracles for a flight's status. Emits `OracleRequest` while the
    /// selected request is still open.
    pub fn request_flight_status(&self, flight: &FlightKey) -> LedgerResult<StatusRequest> {
        let consensus = OracleConsensus::new(&self.config);
        self.mutate(|session, selector, events| {
            consensus.request_status(session, selector, flight, events)
        })
    }

    pub fn status_request(&self, key: &StatusRequestKey) -> LedgerResult<Option<StatusRequest>> {
        Ok(self.read()?.data.storage().get_request(key)?)
    }

    pub fn submit_oracle_response(
        &self,
        oracle: &Address,
        index: u8,
        flight: &FlightKey,
        status: StatusCode,
    ) -> LedgerResult<SubmissionOutcome> {
        let consensus = OracleConsensus::new(&self.config);
        self.mutate(|session, _, events| {
            consensus.submit(session, oracle, index, flight, status, events)
        })
    }

    // Credit

    pub fn credit_balance_of(&self, passenger: &Address) -> LedgerResult<Amount> {
        CreditLedger::balance_of(self.read_operational()?.data.storage(), passenger)
    }

    /// Pay out a passenger's whole credit balance.
    ///
    /// The balance is zeroed and committed before the transfer runs, and the
    /// transfer runs without holding the lock. A failed transfer restores the
    /// balance. `CreditWithdrawn` is published once the transfer has settled.
    pub fn withdraw(&self, passenger: &Address) -> LedgerResult<Amount> {
        let mut events = Vec::new();
        let amount = {
            let mut core = self.write()?;
            let mut session = core.data.session(&self.identity)?;
            CreditLedger::debit_all(&mut session, passenger, &mut events)?
        };

        if let Err(reason) = self.transfer.transfer(passenger, amount) {
            warn!(passenger = %passenger, amount = %amount, reason = %reason, "Transfer failed; restoring credit");
            let mut core = self.write()?;
            CreditLedger::restore(core.data.storage_mut(), passenger, amount)?;
            return Err(LedgerError::TransferFailed {
                to: passenger.clone(),
                reason,
            });
        }

        // The payout has settled, so the event goes out even over a poisoned lock.
        let core = self.core.write().unwrap_or_else(PoisonError::into_inner);
        self.publish(&core, events);
        Ok(amount)
    }

    pub fn summary(&self) -> LedgerResult<LedgerSummary> {
        let core = self.read()?;
        let storage = core.data.storage();
        let airlines = storage.list_airlines()?;
        Ok(LedgerSummary {
            operational: core.data.gate().is_operational(),
            registered_airlines: airlines.iter().filter(|a| a.registered).count(),
            funded_airlines: airlines.iter().filter(|a| a.registered && a.funded).count(),
            pending_airlines: airlines.iter().filter(|a| !a.registered).count(),
            flights: storage.list_flights()?.len(),
            oracles: storage.list_oracles()?.len(),
            escrow: storage.escrow_balance()?,
        })
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerCore>> {
        self.core.read().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Read lock for the membership and balance queries, which share the
    /// mutations' operational gate. Listings and the summary stay open.
    fn read_operational(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerCore>> {
        let core = self.read()?;
        core.data.gate().require_operational()?;
        Ok(core)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerCore>> {
        self.core.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Run one gated transition under the write lock and publish its events
    /// before the lock is released.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut StoreSession<'_>, &mut dyn IndexSelector, &mut Vec<LedgerEvent>) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut events = Vec::new();
        let mut guard = self.write()?;
        let value = {
            let LedgerCore { data, selector } = &mut *guard;
            let mut session = data.session(&self.identity)?;
            op(&mut session, selector.as_mut(), &mut events)?
        };
        self.publish(&guard, events);
        Ok(value)
    }

    /// Send committed events. Holding the write guard keeps envelopes in
    /// commit order across threads; `send` never blocks.
    fn publish(&self, _core: &RwLockWriteGuard<'_, LedgerCore>, events: Vec<LedgerEvent>) {
        for event in events {
            debug!(kind = event.kind(), "Publishing ledger event");
            // No subscribers is not an error.
            let _ = self.events.send(EventEnvelope::new(event));
        }
    }
}

/// Builder for [`FlightSuretyLedger`].
pub struct LedgerBuilder {
    owner: Address,
    identity: Address,
    genesis: Address,
    genesis_name: String,
    genesis_funded: bool,
    config: LedgerConfig,
    selector: Option<Box<dyn IndexSelector>>,
    transfer: Option<Arc<dyn FundsTransfer>>,
    storage: Option<Box<dyn Storage>>,
    event_capacity: usize,
}

impl LedgerBuilder {
    pub fn new(owner: Address, genesis_airline: Address) -> Self {
        Self {
            owner,
            identity: Address::new("flight-surety-app"),
            genesis: genesis_airline,
            genesis_name: "Genesis Airline".to_string(),
            genesis_funded: true,
            config: LedgerConfig::default(),
            selector: None,
            transfer: None,
            storage: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Identity allow-listed on the data layer at construction.
    pub fn identity(mut self, identity: Address) -> Self {
        self.identity = identity;
        self
    }

    pub fn genesis_name(mut self, name: impl Into<String>) -> Self {
        self.genesis_name = name.into();
        self
    }

    /// Seed the genesis airline without its initial deposit; it must call
    /// `fund_airline` before sponsoring anyone.
    pub fn genesis_unfunded(mut self) -> Self {
        self.genesis_funded = false;
        self
    }

    pub fn config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn index_selector(mut self, selector: impl IndexSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    pub fn funds_transfer(mut self, transfer: Arc<dyn FundsTransfer>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> LedgerResult<FlightSuretyLedger> {
        validate(&self.config)?;

        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(InMemoryStorage::new()));
        let mut data = DataLayer::new(self.owner.clone(), storage);
        data.gate_mut().authorize(&self.owner, self.identity.clone())?;

        let deposit = if self.genesis_funded {
            self.config.minimum_funds
        } else {
            Amount::ZERO
        };
        AirlineRegistry::seed_genesis(
            data.storage_mut(),
            self.genesis.clone(),
            self.genesis_name,
            deposit,
        )?;

        let selector = self
            .selector
            .unwrap_or_else(|| Box::new(SeededIndexSelector::from_entropy()));
        let transfer = self
            .transfer
            .unwrap_or_else(|| Arc::new(RecordingTransfer::new()));
        let (events, _) = broadcast::channel(self.event_capacity);

        info!(
            owner = %self.owner,
            identity = %self.identity,
            genesis = %self.genesis,
            funded = self.genesis_funded,
            "Flight surety ledger initialised"
        );

        Ok(FlightSuretyLedger {
            core: RwLock::new(LedgerCore { data, selector }),
            identity: self.identity,
            config: self.config,
            transfer,
            events,
        })
    }
}

fn validate(config: &LedgerConfig) -> LedgerResult<()> {
    if config.quorum == 0 {
        return Err(LedgerError::InvalidConfig("quorum must be at least 1".into()));
    }
    if config.index_space < 3 {
        return Err(LedgerError::InvalidConfig(
            "index space must hold three distinct indexes".into(),
        ));
    }
    if config.minimum_funds.is_zero() {
        return Err(LedgerError::InvalidConfig(
            "minimum funds must be positive".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ETHER;
    use crate::oracles::FixedIndexSelector;

    fn ledger() -> FlightSuretyLedger {
        FlightSuretyLedger::builder(Address::new("0xowner"), Address::new("0xa"))
            .index_selector(FixedIndexSelector::new([0, 1, 2], 1))
            .build()
            .unwrap()
    }

    #[test]
    fn genesis_is_registered_and_funded() {
        let ledger = ledger();
        assert!(ledger.is_operational().unwrap());
        assert!(ledger.is_airline_registered(&Address::new("0xa")).unwrap());
        assert!(ledger.is_airline_funded(&Address::new("0xa")).unwrap());
        assert!(ledger.is_authorized(ledger.identity()).unwrap());

        let summary = ledger.summary().unwrap();
        assert_eq!(summary.registered_airlines, 1);
        assert_eq!(summary.escrow, Amount::new(10 * ETHER));
    }

    #[test]
    fn closed_ledger_blocks_mutations_and_queries() {
        let ledger = ledger();
        let owner = Address::new("0xowner");
        let genesis = Address::new("0xa");
        ledger.set_operational(&owner, false).unwrap();

        let err = ledger.register_flight(&genesis, "ND1309", 1).unwrap_err();
        assert!(matches!(err, LedgerError::NotOperational));

        assert!(matches!(
            ledger.is_airline_registered(&genesis),
            Err(LedgerError::NotOperational)
        ));
        assert!(matches!(
            ledger.is_airline_funded(&genesis),
            Err(LedgerError::NotOperational)
        ));
        assert!(matches!(
            ledger.is_flight_registered(&FlightKey::new(genesis.clone(), "ND1309", 1)),
            Err(LedgerError::NotOperational)
        ));
        assert!(matches!(
            ledger.credit_balance_of(&Address::new("0xp")),
            Err(LedgerError::NotOperational)
        ));

        // Display reads stay available
        assert!(!ledger.is_operational().unwrap());
        assert!(!ledger.summary().unwrap().operational);
        assert_eq!(ledger.airlines().unwrap().len(), 1);

        ledger.set_operational(&owner, true).unwrap();
        ledger
            .register_flight(&Address::new("0xa"), "ND1309", 1)
            .unwrap();
    }

    #[test]
    fn revoked_identity_cannot_mutate() {
        let ledger = ledger();
        let owner = Address::new("0xowner");
        let identity = ledger.identity().clone();
        assert!(ledger.revoke_caller(&owner, &identity).unwrap());

        let err = ledger
            .fund_airline(&Address::new("0xa"), Amount::new(10 * ETHER))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
    }

    #[test]
    fn events_follow_commits() {
        let ledger = ledger();
        let mut rx = ledger.subscribe();

        ledger
            .register_flight(&Address::new("0xa"), "ND1309", 1)
            .unwrap();
        let _ = ledger.register_flight(&Address::new("0xa"), "ND1309", 1);

        let envelope = rx.try_recv().unwrap();
        assert_eq!(envelope.event.kind(), "flight_registered");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = LedgerConfig {
            index_space: 2,
            ..LedgerConfig::default()
        };
        let result = FlightSuretyLedger::builder(Address::new("0xowner"), Address::new("0xa"))
            .config(config)
            .build();
        assert!(matches!(result, Err(LedgerError::InvalidConfig(_))));
    }
}
