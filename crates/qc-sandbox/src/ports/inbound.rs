//! # Driving Ports (API - Inbound)
//!
//! These are the interfaces callers use to describe contracts and drive the
//! simulator through opened contract handles.
//!
//! A contract descriptor ([`Contract`]) declares two capability sets:
//! - query methods: types implementing [`QueryMethod<C>`], handed a
//!   [`QueryProvider`] that can only read state.
//! - mutation methods: types implementing [`MutationMethod<C>`], handed a
//!   [`ContractProvider`] that can also enqueue messages. Opened handles drain
//!   the queue after every mutation.
//!
//! Which capability a call has is fixed by the method type at compile time.

use crate::domain::cell::{Cell, StateInit};
use crate::domain::entities::{AccountSnapshot, GetMethodResult, StackValue};
use crate::domain::value_objects::{Address, Coins};
use crate::errors::SandboxError;
use async_trait::async_trait;

// =============================================================================
// CONTRACT DESCRIPTOR
// =============================================================================

/// Description of a contract: where it lives and how to deploy it.
pub trait Contract: Send + Sync {
    /// Account address.
    fn address(&self) -> Address;

    /// Code and data to deploy with, if the caller intends to deploy.
    fn init(&self) -> Option<&StateInit> {
        None
    }
}

/// A read-only method of contract `C`.
#[async_trait]
pub trait QueryMethod<C: Contract + ?Sized>: Send {
    /// Value the method returns.
    type Output: Send;

    /// Runs the method.
    async fn query(
        self,
        contract: &C,
        provider: &dyn QueryProvider,
    ) -> Result<Self::Output, SandboxError>;
}

/// A state-changing method of contract `C`.
#[async_trait]
pub trait MutationMethod<C: Contract + ?Sized>: Send {
    /// Value the method itself returns, before any queue drain.
    type Output: Send;

    /// Runs the method. Messages it enqueues are delivered afterwards by the
    /// opened handle.
    async fn mutate(
        self,
        contract: &C,
        provider: &dyn ContractProvider,
    ) -> Result<Self::Output, SandboxError>;
}

// =============================================================================
// PROVIDERS
// =============================================================================

/// Read access to one account.
#[async_trait]
pub trait QueryProvider: Send + Sync {
    /// Current account state.
    async fn get_state(&self) -> Result<AccountSnapshot, SandboxError>;

    /// Runs a get-method. Non-success exit codes are errors.
    async fn get(&self, method: &str, args: Vec<StackValue>)
        -> Result<GetMethodResult, SandboxError>;
}

/// Value, bounce flag and body of an internal message sent to a provider's
/// account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalArgs {
    /// Value attached.
    pub value: Coins,
    /// Bounce on failure.
    pub bounce: bool,
    /// Payload.
    pub body: Cell,
}

impl InternalArgs {
    /// Bounceable message with an empty body.
    #[must_use]
    pub fn new(value: Coins) -> Self {
        Self {
            value,
            bounce: true,
            body: Cell::empty(),
        }
    }

    /// Builder-style method to set the body
    #[must_use]
    pub fn with_body(mut self, body: Cell) -> Self {
        self.body = body;
        self
    }

    /// Builder-style method to set the bounce flag
    #[must_use]
    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }
}

/// Read and message-composing access to one account.
#[async_trait]
pub trait ContractProvider: QueryProvider {
    /// Enqueues an inbound external message to the account.
    async fn external(&self, body: Cell) -> Result<(), SandboxError>;

    /// Asks `via` to send an internal message to the account, attaching the
    /// deploy init while the account is not yet active.
    async fn internal(&self, via: &dyn Sender, args: InternalArgs) -> Result<(), SandboxError>;
}

// =============================================================================
// SENDER
// =============================================================================

/// Everything a sender needs to emit one internal message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderArguments {
    /// Destination.
    pub to: Address,
    /// Value attached.
    pub value: Coins,
    /// Bounce on failure.
    pub bounce: bool,
    /// Deploy init for the destination.
    pub init: Option<StateInit>,
    /// Payload.
    pub body: Cell,
}

/// Something able to originate internal messages.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Address messages appear to come from, if fixed.
    fn address(&self) -> Option<Address>;

    /// Enqueues one message.
    async fn send(&self, args: SenderArguments) -> Result<(), SandboxError>;
}
