//! # Blockchain Provider & Sender
//!
//! Routing shims binding a [`Blockchain`] to one address. They own no state
//! beyond that binding.

use crate::domain::cell::{Cell, StateInit};
use crate::domain::entities::{AccountSnapshot, GetMethodResult, Message, StackValue};
use crate::domain::value_objects::Address;
use crate::errors::SandboxError;
use crate::ports::inbound::{
    ContractProvider, InternalArgs, QueryProvider, Sender, SenderArguments,
};
use crate::service::Blockchain;
use async_trait::async_trait;

// =============================================================================
// PROVIDER
// =============================================================================

/// Provider bound to `{blockchain, address, init}`.
#[derive(Clone, Debug)]
pub struct BlockchainContractProvider {
    chain: Blockchain,
    address: Address,
    init: Option<StateInit>,
}

impl BlockchainContractProvider {
    /// Binds a provider.
    #[must_use]
    pub fn new(chain: Blockchain, address: Address, init: Option<StateInit>) -> Self {
        Self {
            chain,
            address,
            init,
        }
    }

    /// Bound address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// The init to attach: only while the account is not active.
    async fn deploy_init(&self) -> Result<Option<StateInit>, SandboxError> {
        let Some(init) = &self.init else {
            return Ok(None);
        };
        if self.get_state().await?.is_active() {
            Ok(None)
        } else {
            Ok(Some(init.clone()))
        }
    }
}

#[async_trait]
impl QueryProvider for BlockchainContractProvider {
    async fn get_state(&self) -> Result<AccountSnapshot, SandboxError> {
        self.chain.get_contract(self.address).await
    }

    async fn get(
        &self,
        method: &str,
        args: Vec<StackValue>,
    ) -> Result<GetMethodResult, SandboxError> {
        let result = self.chain.run_get_method(self.address, method, &args).await?;
        if !result.is_success() {
            return Err(SandboxError::Query {
                method: method.to_string(),
                exit_code: result.exit_code,
            });
        }
        Ok(result)
    }
}

#[async_trait]
impl ContractProvider for BlockchainContractProvider {
    async fn external(&self, body: Cell) -> Result<(), SandboxError> {
        let init = self.deploy_init().await?;
        self.chain
            .push_message(Message::external_in(self.address, body).with_init(init))
    }

    async fn internal(&self, via: &dyn Sender, args: InternalArgs) -> Result<(), SandboxError> {
        let init = self.deploy_init().await?;
        via.send(SenderArguments {
            to: self.address,
            value: args.value,
            bounce: args.bounce,
            init,
            body: args.body,
        })
        .await
    }
}

// =============================================================================
// SENDER
// =============================================================================

/// Sender that enqueues internal messages appearing to come from `address`.
///
/// No account logic runs at `address`; useful for driving contracts from
/// arbitrary wallets in tests.
#[derive(Clone, Debug)]
pub struct BlockchainSender {
    chain: Blockchain,
    address: Address,
}

impl BlockchainSender {
    /// Binds a sender.
    #[must_use]
    pub fn new(chain: Blockchain, address: Address) -> Self {
        Self { chain, address }
    }
}

#[async_trait]
impl Sender for BlockchainSender {
    fn address(&self) -> Option<Address> {
        Some(self.address)
    }

    async fn send(&self, args: SenderArguments) -> Result<(), SandboxError> {
        let message = Message::internal(self.address, args.to, args.value, args.bounce, args.body)
            .with_init(args.init);
        self.chain.push_message(message)
    }
}
