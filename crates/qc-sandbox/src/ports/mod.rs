//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the ledger sandbox.
//! These are the interfaces between the simulator core and the outside world.
//!
//! - **Driving Ports (Inbound)**: `Contract`, `QueryMethod`, `MutationMethod`,
//!   `QueryProvider`, `ContractProvider`, `Sender`
//! - **Driven Ports (Outbound)**: `AccountStore`, `AccountHandle`, `Executor`,
//!   `EventExtractor`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
