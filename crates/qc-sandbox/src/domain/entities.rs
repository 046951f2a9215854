//! # Core Domain Entities
//!
//! Messages, transactions and events of the simulated ledger.

use crate::domain::cell::{Cell, StateInit};
use crate::domain::value_objects::{Address, Coins, Hash, LogicalTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// =============================================================================
// MESSAGES
// =============================================================================

/// Kind tag of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Account-to-account message carrying value.
    Internal,
    /// Inbound message from outside the ledger.
    ExternalIn,
    /// Outbound message to outside the ledger. Never delivered.
    ExternalOut,
}

/// Routing header of a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageInfo {
    /// Account-to-account message.
    Internal {
        /// Sending account.
        src: Address,
        /// Receiving account.
        dest: Address,
        /// Value attached.
        value: Coins,
        /// Bounce back to `src` if processing fails.
        bounce: bool,
        /// This message is itself a bounce.
        bounced: bool,
    },
    /// Inbound external message.
    ExternalIn {
        /// Receiving account.
        dest: Address,
    },
    /// Outbound external message (log-like output).
    ExternalOut {
        /// Emitting account.
        src: Address,
    },
}

/// An immutable ledger message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Routing header.
    pub info: MessageInfo,
    /// Code and data to deploy the destination with, if not yet active.
    pub init: Option<StateInit>,
    /// Payload.
    pub body: Cell,
}

impl Message {
    /// Builds an internal message.
    #[must_use]
    pub fn internal(src: Address, dest: Address, value: Coins, bounce: bool, body: Cell) -> Self {
        Self {
            info: MessageInfo::Internal {
                src,
                dest,
                value,
                bounce,
                bounced: false,
            },
            init: None,
            body,
        }
    }

    /// Builds an inbound external message.
    #[must_use]
    pub fn external_in(dest: Address, body: Cell) -> Self {
        Self {
            info: MessageInfo::ExternalIn { dest },
            init: None,
            body,
        }
    }

    /// Builds an outbound external message.
    #[must_use]
    pub fn external_out(src: Address, body: Cell) -> Self {
        Self {
            info: MessageInfo::ExternalOut { src },
            init: None,
            body,
        }
    }

    /// Attaches a state init.
    #[must_use]
    pub fn with_init(mut self, init: Option<StateInit>) -> Self {
        self.init = init;
        self
    }

    /// Kind tag.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self.info {
            MessageInfo::Internal { .. } => MessageKind::Internal,
            MessageInfo::ExternalIn { .. } => MessageKind::ExternalIn,
            MessageInfo::ExternalOut { .. } => MessageKind::ExternalOut,
        }
    }

    /// Destination account; `None` for external-out messages.
    #[must_use]
    pub fn destination(&self) -> Option<Address> {
        match self.info {
            MessageInfo::Internal { dest, .. } | MessageInfo::ExternalIn { dest } => Some(dest),
            MessageInfo::ExternalOut { .. } => None,
        }
    }

    /// Value carried; zero for external messages.
    #[must_use]
    pub fn value(&self) -> Coins {
        match self.info {
            MessageInfo::Internal { value, .. } => value,
            _ => Coins::zero(),
        }
    }
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Lifecycle status of an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountStatus {
    /// Never touched, or destroyed.
    #[default]
    NonExisting,
    /// Holds a balance but no code.
    Uninit,
    /// Deployed with code and data.
    Active,
}

/// Read-only view of an account's state.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AccountSnapshot {
    /// Account address.
    pub address: Address,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Balance.
    pub balance: Coins,
    /// Code and data, present once active.
    pub state: Option<StateInit>,
    /// Logical time of the account's last transaction.
    pub last_transaction_lt: LogicalTime,
}

impl AccountSnapshot {
    /// Snapshot of an account nobody has touched yet.
    #[must_use]
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Returns true once code and data are deployed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Hash over status, balance, code and data.
    #[must_use]
    pub fn state_hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update([self.status as u8]);
        let mut balance = [0u8; 32];
        self.balance.to_big_endian(&mut balance);
        hasher.update(balance);
        if let Some(state) = &self.state {
            hasher.update(state.hash().as_bytes());
        }
        Hash::new(hasher.finalize().into())
    }
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Outcome of the compute phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComputePhase {
    /// Compute was skipped (no code to run).
    Skipped {
        /// Why nothing ran.
        reason: SkipReason,
    },
    /// Code ran to completion or failure.
    Executed {
        /// Whether the contract accepted the message.
        success: bool,
        /// Exit code (`0` on success).
        exit_code: i32,
    },
}

/// Reason the compute phase was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Account has no code and the message carried no usable init.
    NoState,
    /// The message carried an init that does not match the address.
    BadState,
}

/// Effect metadata of a transaction, consumed by event extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDescription {
    /// Compute phase result.
    pub compute: ComputePhase,
    /// Transaction was aborted and its state changes discarded.
    pub aborted: bool,
    /// Account was destroyed by this transaction.
    pub destroyed: bool,
    /// A bounce message was produced.
    pub bounced: bool,
}

/// The record of one message applied to one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Logical time the message was delivered at.
    pub lt: LogicalTime,
    /// Destination account.
    pub account: Address,
    /// The delivered message.
    pub in_message: Message,
    /// Messages emitted, in emission order.
    pub out_messages: Vec<Message>,
    /// Status before the transaction.
    pub old_status: AccountStatus,
    /// Status after the transaction.
    pub end_status: AccountStatus,
    /// Balance after the transaction.
    pub balance_after: Coins,
    /// Hash of the account state after the transaction.
    pub state_hash: Hash,
    /// Effect metadata.
    pub description: TransactionDescription,
}

// =============================================================================
// EVENTS
// =============================================================================

/// Typed projection of a transaction's effects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// An account became active.
    AccountCreated {
        /// The account.
        account: Address,
    },
    /// An account was destroyed.
    AccountDestroyed {
        /// The account.
        account: Address,
    },
    /// An internal message was emitted.
    MessageSent {
        /// Sender.
        from: Address,
        /// Receiver.
        to: Address,
        /// Value attached.
        value: Coins,
        /// Payload.
        body: Cell,
        /// Whether the message is a bounce.
        bounced: bool,
    },
}

/// Everything a single drain produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendMessageResult {
    /// Transactions in delivery order.
    pub transactions: Vec<Transaction>,
    /// Events in transaction order, then emission order.
    pub events: Vec<Event>,
}

/// Result of a mutation call on an opened contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendResult<R> {
    /// Value returned by the mutation itself.
    pub result: R,
    /// Transactions caused by the call.
    pub transactions: Vec<Transaction>,
    /// Events caused by the call.
    pub events: Vec<Event>,
}

impl<R> SendResult<R> {
    /// Combines a call's own return value with the drain it caused.
    #[must_use]
    pub fn new(result: R, drained: SendMessageResult) -> Self {
        Self {
            result,
            transactions: drained.transactions,
            events: drained.events,
        }
    }
}

// =============================================================================
// GET METHODS
// =============================================================================

/// A value passed to or returned from a get-method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackValue {
    /// Integer.
    Int(Coins),
    /// Cell.
    Cell(Cell),
    /// Address.
    Address(Address),
}

/// Result of running a get-method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetMethodResult {
    /// Exit code (`0` or `1` on success).
    pub exit_code: i32,
    /// Returned stack, bottom first.
    pub stack: Vec<StackValue>,
}

impl GetMethodResult {
    /// Returns true for the success exit codes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.exit_code, 0 | 1)
    }
}

// =============================================================================
// DIAGNOSTICS & CONFIG
// =============================================================================

/// Diagnostic detail the executor emits while running an account.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// No executor diagnostics.
    #[default]
    None,
    /// Compute-phase summaries.
    VmLogs,
    /// Summaries plus every out-action.
    VmLogsFull,
}

/// Opaque network configuration consumed by the executor.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NetworkConfig(pub Cell);

impl NetworkConfig {
    /// Wraps a configuration cell.
    #[must_use]
    pub fn new(cell: Cell) -> Self {
        Self(cell)
    }

    /// The underlying cell.
    #[must_use]
    pub fn as_cell(&self) -> &Cell {
        &self.0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new(0, Hash::new([b; 32]))
    }

    #[test]
    fn test_message_kind_and_destination() {
        let m = Message::internal(addr(1), addr(2), Coins::from(5u64), true, Cell::empty());
        assert_eq!(m.kind(), MessageKind::Internal);
        assert_eq!(m.destination(), Some(addr(2)));
        assert_eq!(m.value(), Coins::from(5u64));

        let ext = Message::external_in(addr(3), Cell::empty());
        assert_eq!(ext.kind(), MessageKind::ExternalIn);
        assert_eq!(ext.value(), Coins::zero());

        let out = Message::external_out(addr(3), Cell::empty());
        assert_eq!(out.kind(), MessageKind::ExternalOut);
        assert_eq!(out.destination(), None);
    }

    #[test]
    fn test_send_result_merges_drain() {
        let r = SendResult::new(7u32, SendMessageResult::default());
        assert_eq!(r.result, 7);
        assert!(r.transactions.is_empty());
        assert!(r.events.is_empty());
    }

    #[test]
    fn test_verbosity_serde() {
        let v: Verbosity = serde_json::from_str("\"vm_logs_full\"").unwrap();
        assert_eq!(v, Verbosity::VmLogsFull);
        assert_eq!(Verbosity::default(), Verbosity::None);
    }
}
