//! Storage trait definitions

use crate::error::StorageResult;
use crate::types::{
    Address, Airline, Amount, Flight, FlightKey, InsurancePolicy, Oracle, StatusRequest,
    StatusRequestKey,
};

/// Combined storage trait
pub trait Storage:
    AirlineStorage
    + FlightStorage
    + PolicyStorage
    + OracleStorage
    + CreditStorage
    + EscrowStorage
    + Send
    + Sync
{
}

impl<T> Storage for T where
    T: AirlineStorage
        + FlightStorage
        + PolicyStorage
        + OracleStorage
        + CreditStorage
        + EscrowStorage
        + Send
        + Sync
{
}

/// Storage for airlines and their admission votes
pub trait AirlineStorage {
    fn get_airline(&self, address: &Address) -> StorageResult<Option<Airline>>;

    fn upsert_airline(&mut self, airline: Airline) -> StorageResult<()>;

    /// Number of airlines with `registered == true`
    fn registered_airline_count(&self) -> StorageResult<usize>;

    fn list_airlines(&self) -> StorageResult<Vec<Airline>>;
}

/// Storage for flights
pub trait FlightStorage {
    fn get_flight(&self, key: &FlightKey) -> StorageResult<Option<Flight>>;

    /// Insert a new flight; fails with `Conflict` if the key exists
    fn insert_flight(&mut self, flight: Flight) -> StorageResult<()>;

    /// Replace an existing flight record
    fn update_flight(&mut self, flight: Flight) -> StorageResult<()>;

    fn list_flights(&self) -> StorageResult<Vec<Flight>>;
}

/// Storage for insurance policies
pub trait PolicyStorage {
    fn get_policy(
        &self,
        passenger: &Address,
        flight: &FlightKey,
    ) -> StorageResult<Option<InsurancePolicy>>;

    /// Insert a new policy; fails with `Conflict` if one exists for the key
    fn insert_policy(&mut self, policy: InsurancePolicy) -> StorageResult<()>;

    fn update_policy(&mut self, policy: InsurancePolicy) -> StorageResult<()>;

    /// All policies on a flight, active or not
    fn policies_for_flight(&self, flight: &FlightKey) -> StorageResult<Vec<InsurancePolicy>>;
}

/// Storage for oracles and their status requests
pub trait OracleStorage {
    fn get_oracle(&self, address: &Address) -> StorageResult<Option<Oracle>>;

    fn insert_oracle(&mut self, oracle: Oracle) -> StorageResult<()>;

    fn list_oracles(&self) -> StorageResult<Vec<Oracle>>;

    fn get_request(&self, key: &StatusRequestKey) -> StorageResult<Option<StatusRequest>>;

    fn upsert_request(&mut self, request: StatusRequest) -> StorageResult<()>;
}

/// Storage for passenger credit balances
pub trait CreditStorage {
    /// Balance of a passenger; zero for unknown passengers
    fn credit_balance(&self, passenger: &Address) -> StorageResult<Amount>;

    fn set_credit_balance(&mut self, passenger: &Address, balance: Amount) -> StorageResult<()>;
}

/// Storage for the ledger's own escrowed funds
pub trait EscrowStorage {
    fn escrow_balance(&self) -> StorageResult<Amount>;

    fn set_escrow_balance(&mut self, balance: Amount) -> StorageResult<()>;
}
