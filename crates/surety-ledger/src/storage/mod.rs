//! Storage layer for the ledger
//!
//! The storage capability is split per entity, like the rest of the data layer.
//! Mutable access is only handed out through an authorized [`crate::gate::StoreSession`].

mod memory;
mod traits;

pub use memory::InMemoryStorage;
pub use traits::{
    AirlineStorage, CreditStorage, EscrowStorage, FlightStorage, OracleStorage, PolicyStorage,
    Storage,
};
