//! # Sandbox Account
//!
//! Account handle backed by an [`Executor`]. Holds the account's state
//! between transactions and its verbosity override.

use crate::domain::entities::{
    AccountSnapshot, GetMethodResult, Message, StackValue, Transaction, Verbosity,
};
use crate::domain::value_objects::{Address, Coins};
use crate::errors::AccountError;
use crate::ports::outbound::{AccountHandle, ExecutionEnv, Executor};
use async_trait::async_trait;
use std::sync::Arc;

/// In-memory account driven by an executor.
pub struct SandboxAccount {
    state: AccountSnapshot,
    verbosity: Option<Verbosity>,
    executor: Arc<dyn Executor>,
}

impl SandboxAccount {
    /// Creates a non-existing account at `address`.
    #[must_use]
    pub fn new(address: Address, executor: Arc<dyn Executor>) -> Self {
        Self {
            state: AccountSnapshot::empty(address),
            verbosity: None,
            executor,
        }
    }

    fn effective_env(&self, env: &ExecutionEnv) -> ExecutionEnv {
        ExecutionEnv {
            verbosity: self.verbosity.unwrap_or(env.verbosity),
            ..env.clone()
        }
    }
}

impl std::fmt::Debug for SandboxAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxAccount")
            .field("state", &self.state)
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccountHandle for SandboxAccount {
    fn address(&self) -> Address {
        self.state.address
    }

    fn snapshot(&self) -> AccountSnapshot {
        self.state.clone()
    }

    fn set_balance(&mut self, balance: Coins) {
        self.state.balance = balance;
    }

    fn verbosity(&self) -> Option<Verbosity> {
        self.verbosity
    }

    fn set_verbosity(&mut self, verbosity: Option<Verbosity>) {
        self.verbosity = verbosity;
    }

    async fn apply(
        &mut self,
        message: &Message,
        env: &ExecutionEnv,
    ) -> Result<Transaction, AccountError> {
        let env = self.effective_env(env);
        let outcome = self
            .executor
            .run_transaction(&self.state, message, &env)
            .await?;

        let old_status = self.state.status;
        self.state = outcome.account;
        self.state.last_transaction_lt = env.lt;

        Ok(Transaction {
            lt: env.lt,
            account: self.state.address,
            in_message: message.clone(),
            out_messages: outcome.out_messages,
            old_status,
            end_status: self.state.status,
            balance_after: self.state.balance,
            state_hash: self.state.state_hash(),
            description: outcome.description,
        })
    }

    async fn query(
        &self,
        method: &str,
        args: &[StackValue],
        env: &ExecutionEnv,
    ) -> Result<GetMethodResult, AccountError> {
        let env = self.effective_env(env);
        Ok(self
            .executor
            .run_get_method(&self.state, method, args, &env)
            .await?)
    }
}
