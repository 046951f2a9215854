//! # Driven Ports (SPI - Outbound)
//!
//! These are the interfaces the simulator core depends on.
//! External adapters implement these traits to provide:
//! - Account storage and per-account state transition (`AccountStore`, `AccountHandle`)
//! - The state-transition unit itself (`Executor`)
//! - Event derivation (`EventExtractor`)
//!
//! The core never inspects or mutates account state directly; it only goes
//! through `AccountHandle::apply` and `AccountHandle::query`.

use crate::domain::entities::{
    AccountSnapshot, Event, GetMethodResult, Message, NetworkConfig, StackValue, Transaction,
    TransactionDescription, Verbosity,
};
use crate::domain::value_objects::{Address, Coins, LogicalTime};
use crate::errors::{AccountError, ExecutorError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

// =============================================================================
// EXECUTION ENVIRONMENT
// =============================================================================

/// Ledger-wide inputs to one state transition or get-method run.
#[derive(Clone, Debug)]
pub struct ExecutionEnv {
    /// Logical time of the delivery (current time for get-methods).
    pub lt: LogicalTime,
    /// Fixed unix time.
    pub unix_time: u32,
    /// Opaque network configuration.
    pub config: NetworkConfig,
    /// Effective diagnostic verbosity.
    pub verbosity: Verbosity,
}

// =============================================================================
// ACCOUNT STORE
// =============================================================================

/// One addressable account, able to apply messages and answer queries.
#[async_trait]
pub trait AccountHandle: Send + Sync {
    /// Account address.
    fn address(&self) -> Address;

    /// Current state.
    fn snapshot(&self) -> AccountSnapshot;

    /// Overwrites the balance (setup helper).
    fn set_balance(&mut self, balance: Coins);

    /// Per-account verbosity override, if any.
    fn verbosity(&self) -> Option<Verbosity>;

    /// Sets (`Some`) or clears (`None`) the per-account verbosity override.
    fn set_verbosity(&mut self, verbosity: Option<Verbosity>);

    /// Applies one inbound message, producing exactly one transaction.
    ///
    /// Failures propagate to the caller untouched.
    async fn apply(
        &mut self,
        message: &Message,
        env: &ExecutionEnv,
    ) -> Result<Transaction, AccountError>;

    /// Runs a read-only get-method.
    async fn query(
        &self,
        method: &str,
        args: &[StackValue],
        env: &ExecutionEnv,
    ) -> Result<GetMethodResult, AccountError>;
}

/// Shared, lockable account handle.
pub type SharedAccount = Arc<Mutex<Box<dyn AccountHandle>>>;

/// Maps addresses to accounts.
///
/// ## Implementation Notes
///
/// `get_account` must be idempotent: repeated calls for one address return
/// the same account. Lazily creating a fresh account is its only permitted
/// side effect.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns the account at `address`, creating an empty one if needed.
    async fn get_account(&self, address: Address) -> Result<SharedAccount, AccountError>;

    /// Addresses of every account created so far.
    async fn known_accounts(&self) -> Vec<Address>;
}

// =============================================================================
// EXECUTOR (state-transition unit)
// =============================================================================

/// Result of running one message against one account state.
#[derive(Clone, Debug)]
pub struct TransactionOutcome {
    /// Account state after the transaction.
    pub account: AccountSnapshot,
    /// Emitted messages, in emission order.
    pub out_messages: Vec<Message>,
    /// Effect metadata.
    pub description: TransactionDescription,
}

/// Deterministic state-transition function.
///
/// Given an account's state and an inbound message, produces the new state,
/// the outbound messages and transaction metadata. Must not retain state
/// between calls that would change its output.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Applies `message` to `account`.
    async fn run_transaction(
        &self,
        account: &AccountSnapshot,
        message: &Message,
        env: &ExecutionEnv,
    ) -> Result<TransactionOutcome, ExecutorError>;

    /// Runs a get-method against `account`.
    async fn run_get_method(
        &self,
        account: &AccountSnapshot,
        method: &str,
        args: &[StackValue],
        env: &ExecutionEnv,
    ) -> Result<GetMethodResult, ExecutorError>;
}

// =============================================================================
// EVENT EXTRACTOR
// =============================================================================

/// Derives domain events from a transaction. Must be a pure function of its
/// argument.
pub trait EventExtractor: Send + Sync {
    /// Events implied by `tx`, in emission order.
    fn extract(&self, tx: &Transaction) -> Vec<Event>;
}
