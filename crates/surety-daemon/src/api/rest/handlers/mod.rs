//! API request handlers

mod airlines;
mod credit;
mod events;
mod flights;
mod gate;
mod health;
mod insurance;
mod oracles;
mod simulator;

pub use airlines::*;
pub use credit::*;
pub use events::*;
pub use flights::*;
pub use gate::*;
pub use health::*;
pub use insurance::*;
pub use oracles::*;
pub use simulator::*;
