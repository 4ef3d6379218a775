//! In-memory storage implementation

use std::collections::{BTreeMap, HashMap};

use super::traits::*;
use crate::error::{StorageError, StorageResult};
use crate::types::{
    Address, Airline, Amount, Flight, FlightKey, InsurancePolicy, Oracle, StatusRequest,
    StatusRequestKey,
};

/// In-memory storage for development and testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    airlines: HashMap<Address, Airline>,
    flights: BTreeMap<FlightKey, Flight>,
    policies: BTreeMap<(FlightKey, Address), InsurancePolicy>,
    oracles: BTreeMap<Address, Oracle>,
    requests: HashMap<StatusRequestKey, StatusRequest>,
    credits: HashMap<Address, Amount>,
    escrow: Amount,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl AirlineStorage for InMemoryStorage {
    fn get_airline(&self, address: &Address) -> StorageResult<Option<Airline>> {
        Ok(self.airlines.get(address).cloned())
    }

    fn upsert_airline(&mut self, airline: Airline) -> StorageResult<()> {
        self.airlines.insert(airline.address.clone(), airline);
        Ok(())
    }

    fn registered_airline_count(&self) -> StorageResult<usize> {
        Ok(self.airlines.values().filter(|a| a.registered).count())
    }

    fn list_airlines(&self) -> StorageResult<Vec<Airline>> {
        let mut airlines: Vec<_> = self.airlines.values().cloned().collect();
        airlines.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(airlines)
    }
}

impl FlightStorage for InMemoryStorage {
    fn get_flight(&self, key: &FlightKey) -> StorageResult<Option<Flight>> {
        Ok(self.flights.get(key).cloned())
    }

    fn insert_flight(&mut self, flight: Flight) -> StorageResult<()> {
        if self.flights.contains_key(&flight.key) {
            return Err(StorageError::Conflict(format!("flight {}", flight.key)));
        }
        self.flights.insert(flight.key.clone(), flight);
        Ok(())
    }

    fn update_flight(&mut self, flight: Flight) -> StorageResult<()> {
        match self.flights.get_mut(&flight.key) {
            Some(existing) => {
                *existing = flight;
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("flight {}", flight.key))),
        }
    }

    fn list_flights(&self) -> StorageResult<Vec<Flight>> {
        Ok(self.flights.values().cloned().collect())
    }
}

impl PolicyStorage for InMemoryStorage {
    fn get_policy(
        &self,
        passenger: &Address,
        flight: &FlightKey,
    ) -> StorageResult<Option<InsurancePolicy>> {
        Ok(self
            .policies
            .get(&(flight.clone(), passenger.clone()))
            .cloned())
    }

    fn insert_policy(&mut self, policy: InsurancePolicy) -> StorageResult<()> {
        let key = (policy.flight.clone(), policy.passenger.clone());
        if self.policies.contains_key(&key) {
            return Err(StorageError::Conflict(format!(
                "policy {} on {}",
                policy.passenger, policy.flight
            )));
        }
        self.policies.insert(key, policy);
        Ok(())
    }

    fn update_policy(&mut self, policy: InsurancePolicy) -> StorageResult<()> {
        let key = (policy.flight.clone(), policy.passenger.clone());
        match self.policies.get_mut(&key) {
            Some(existing) => {
                *existing = policy;
                Ok(())
            }
            None => Err(StorageError::NotFound(format!(
                "policy {} on {}",
                policy.passenger, policy.flight
            ))),
        }
    }

    fn policies_for_flight(&self, flight: &FlightKey) -> StorageResult<Vec<InsurancePolicy>> {
        // Keys are ordered by flight first, so one flight's policies are contiguous.
        Ok(self
            .policies
            .range((flight.clone(), Address::new(""))..)
            .take_while(|((key, _), _)| key == flight)
            .map(|(_, policy)| policy.clone())
            .collect())
    }
}

impl OracleStorage for InMemoryStorage {
    fn get_oracle(&self, address: &Address) -> StorageResult<Option<Oracle>> {
        Ok(self.oracles.get(address).cloned())
    }

    fn insert_oracle(&mut self, oracle: Oracle) -> StorageResult<()> {
        if self.oracles.contains_key(&oracle.address) {
            return Err(StorageError::Conflict(format!("oracle {}", oracle.address)));
        }
        self.oracles.insert(oracle.address.clone(), oracle);
        Ok(())
    }

    fn list_oracles(&self) -> StorageResult<Vec<Oracle>> {
        Ok(self.oracles.values().cloned().collect())
    }

    fn get_request(&self, key: &StatusRequestKey) -> StorageResult<Option<StatusRequest>> {
        Ok(self.requests.get(key).cloned())
    }

    fn upsert_request(&mut self, request: StatusRequest) -> StorageResult<()> {
        self.requests.insert(request.key.clone(), request);
        Ok(())
    }
}

impl CreditStorage for InMemoryStorage {
    fn credit_balance(&self, passenger: &Address) -> StorageResult<Amount> {
        Ok(self.credits.get(passenger).copied().unwrap_or_default())
    }

    fn set_credit_balance(&mut self, passenger: &Address, balance: Amount) -> StorageResult<()> {
        self.credits.insert(passenger.clone(), balance);
        Ok(())
    }
}

impl EscrowStorage for InMemoryStorage {
    fn escrow_balance(&self) -> StorageResult<Amount> {
        Ok(self.escrow)
    }

    fn set_escrow_balance(&mut self, balance: Amount) -> StorageResult<()> {
        self.escrow = balance;
        Ok(())
    }
}
