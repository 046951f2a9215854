//! # QC Sandbox - Deterministic Ledger Simulator
//!
//! **Architecture:** hexagonal (domain / ports / adapters / service)
//!
//! ## Purpose
//!
//! Runs contract scenarios against a simulated message-passing ledger without
//! a network. Messages are delivered one at a time from a FIFO queue, each
//! delivery producing one transaction stamped with a unique logical time.
//! Messages emitted by a transaction join the tail of the queue, so a single
//! root message expands breadth-first until the queue is empty.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Logical time advances by exactly one step per delivery | `domain/clock.rs`, `service.rs` |
//! | INVARIANT-2 | External-out messages are never delivered | `domain/queue.rs`, `service.rs` |
//! | INVARIANT-3 | Validation errors never touch the queue | `service.rs` - `open_contract()`, `send_message()` |
//! | INVARIANT-4 | One drain per instance at a time | `service.rs` - `DrainGuard` |
//!
//! ## Outbound Dependencies
//!
//! | Port | Default Adapter | Purpose |
//! |------|-----------------|---------|
//! | `AccountStore` | `LocalAccountStore` | Addressable accounts, lazily created |
//! | `Executor` | `NativeExecutor` | Per-account state transition |
//! | `EventExtractor` | `DefaultEventExtractor` | Events from transactions |
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc_sandbox::prelude::*;
//!
//! let chain = Blockchain::create(SandboxConfig::default(), None)?;
//! let treasury = chain.treasury("treasury", 0).await?;
//!
//! let res = treasury
//!     .send(Transfer::single(SenderArguments {
//!         to: target,
//!         value: to_nano(1),
//!         bounce: false,
//!         init: None,
//!         body: Cell::empty(),
//!     }))
//!     .await?;
//! assert_eq!(res.transactions.len(), 2);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        AccountSnapshot, AccountStatus, ComputePhase, Event, GetMethodResult, Message,
        MessageInfo, MessageKind, NetworkConfig, SendMessageResult, SendResult, SkipReason,
        StackValue, Transaction, TransactionDescription, Verbosity,
    };

    // Cells
    pub use crate::domain::cell::{Cell, CellBuilder, CellSlice, StateInit};

    // Value objects
    pub use crate::domain::value_objects::{to_nano, Address, Coins, Hash, LogicalTime, U256};

    // Invariants
    pub use crate::domain::invariants::{check_all_invariants, InvariantViolation};

    // Ports
    pub use crate::ports::inbound::{
        Contract, ContractProvider, InternalArgs, MutationMethod, QueryMethod, QueryProvider,
        Sender, SenderArguments,
    };
    pub use crate::ports::outbound::{
        AccountHandle, AccountStore, EventExtractor, ExecutionEnv, Executor, SharedAccount,
    };

    // Adapters
    pub use crate::adapters::{
        send_mode, Accepted, BlockchainContractProvider, BlockchainSender,
        DefaultEventExtractor, LocalAccountStore, NativeContract, NativeExecutor, OutAction,
        ReceiveContext, Rejection, Seqno, Transfer, TreasuryContract, TreasurySender,
    };

    // Errors
    pub use crate::errors::{AccountError, CellError, ConfigError, ExecutorError, SandboxError};

    // Config & service
    pub use crate::config::{SandboxConfig, MAX_LT_STEP};
    pub use crate::service::{Blockchain, BlockchainStats, OpenedContract};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_exports() {
        use prelude::*;
        let _ = SandboxConfig::default();
        let _ = Address::default();
        assert!(!VERSION.is_empty());
    }
}
