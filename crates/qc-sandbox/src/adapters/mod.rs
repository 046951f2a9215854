//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the sandbox ports.
//!
//! - `storage` / `account`: in-memory [`AccountStore`](crate::ports::AccountStore)
//! - `executor`: native Rust contract logic behind [`Executor`](crate::ports::Executor)
//! - `provider` / `treasury`: providers and senders bound to a blockchain
//! - `event_extractor`: default event derivation

pub mod account;
pub mod event_extractor;
pub mod executor;
pub mod provider;
pub mod storage;
pub mod treasury;

pub use account::*;
pub use event_extractor::*;
pub use executor::*;
pub use provider::*;
pub use storage::*;
pub use treasury::*;
