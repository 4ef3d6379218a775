//! Flight registry.

use chrono::Utc;
use tracing::info;

use crate::airlines::AirlineRegistry;
use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::gate::StoreSession;
use crate::storage::{FlightStorage, Storage};
use crate::types::{Address, Flight, FlightKey, StatusCode};

pub struct FlightRegistry;

impl FlightRegistry {
    /// Register a flight for a funded airline.
    pub fn register(
        session: &mut StoreSession<'_>,
        airline: &Address,
        code: &str,
        departure: u64,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<Flight> {
        if !AirlineRegistry::is_registered(&**session, airline)?
            || !AirlineRegistry::is_funded(&**session, airline)?
        {
            return Err(LedgerError::unauthorized(format!(
                "{} is not a funded airline",
                airline
            )));
        }

        let key = FlightKey::new(airline.clone(), code, departure);
        if session.get_flight(&key)?.is_some() {
            return Err(LedgerError::AlreadyRegistered(format!("flight {}", key)));
        }

        let flight = Flight {
            key: key.clone(),
            registered: true,
            status: StatusCode::Unknown,
            registered_at: Utc::now(),
        };
        session.insert_flight(flight.clone())?;

        info!(flight = %key, "Flight registered");
        events.push(LedgerEvent::FlightRegistered { flight: key });
        Ok(flight)
    }

    pub fn is_registered(storage: &dyn Storage, key: &FlightKey) -> LedgerResult<bool> {
        Ok(storage
            .get_flight(key)?
            .map(|f| f.registered)
            .unwrap_or(false))
    }

    /// Fetch a registered flight or fail with `FlightNotRegistered`.
    pub fn require(storage: &dyn Storage, key: &FlightKey) -> LedgerResult<Flight> {
        storage
            .get_flight(key)?
            .filter(|f| f.registered)
            .ok_or_else(|| LedgerError::FlightNotRegistered(key.clone()))
    }
}
