//! # Domain Layer (Inner Hexagon)
//!
//! Pure logic of the simulated ledger: values, messages, transactions,
//! the logical clock and the message queue.
//! NO I/O, NO async.
//!
//! - Dependencies point INWARD only (adapters depend on this, not vice versa).

pub mod cell;
pub mod clock;
pub mod entities;
pub mod invariants;
pub mod queue;
pub mod services;
pub mod value_objects;

pub use cell::*;
pub use clock::*;
pub use entities::*;
pub use invariants::*;
pub use queue::*;
pub use services::*;
pub use value_objects::*;
