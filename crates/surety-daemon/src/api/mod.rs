//! HTTP API
//!
//! The API is a development and demo surface and is unauthenticated. Caller,
//! sponsor, airline, passenger and oracle identities are taken from the request
//! as given, so any client can act as any address, including the owner.
//! Do not expose it beyond a trusted network.

pub mod rest;

pub use rest::router::create_router;
