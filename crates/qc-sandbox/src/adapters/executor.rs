//! # Native Executor
//!
//! State-transition unit that runs contract logic written in Rust.
//!
//! Contracts are registered against a code cell; an account whose deployed
//! code hashes to a registered cell runs that logic. One transaction goes
//! through the phases below:
//!
//! | Phase | Effect |
//! |-------|--------|
//! | Credit | inbound value added to the balance, `NonExisting` becomes `Uninit` |
//! | Deploy | `init` matching the address makes the account `Active` |
//! | Compute | registered logic accepts (new data + actions) or rejects (exit code) |
//! | Action | out-actions become out messages, balance debited |
//! | Bounce | failed bounceable internal messages return their value |
//!
//! Rejected external messages are not transactions: they fail with
//! [`ExecutorError::ExternalNotAccepted`], which aborts the drain.

use crate::domain::cell::{Cell, CellBuilder, StateInit};
use crate::domain::entities::{
    AccountSnapshot, AccountStatus, ComputePhase, GetMethodResult, Message, MessageInfo,
    SkipReason, StackValue, TransactionDescription, Verbosity,
};
use crate::domain::value_objects::{Address, Coins, Hash};
use crate::errors::ExecutorError;
use crate::ports::outbound::{ExecutionEnv, Executor, TransactionOutcome};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Exit codes reported by the native executor.
pub mod exit_codes {
    /// Success.
    pub const SUCCESS: i32 = 0;
    /// Message or data could not be parsed.
    pub const CELL_UNDERFLOW: i32 = 9;
    /// No logic registered for the deployed code.
    pub const UNKNOWN_CODE: i32 = 10;
    /// Get-method not implemented.
    pub const METHOD_NOT_FOUND: i32 = 11;
    /// Out-actions spend more than the balance.
    pub const NOT_ENOUGH_BALANCE: i32 = 37;
}

/// Flags of [`OutAction::SendMessage`].
pub mod send_mode {
    /// Use the message's own value.
    pub const ORDINARY: u8 = 0;
    /// Destroy the account if its balance reaches zero.
    pub const DESTROY_IF_ZERO: u8 = 32;
    /// Carry the whole remaining balance.
    pub const CARRY_ALL_BALANCE: u8 = 128;
}

/// Op code prefixed to bounce bodies.
pub const BOUNCE_OP: u32 = 0xFFFF_FFFF;

// =============================================================================
// NATIVE CONTRACT
// =============================================================================

/// Inputs visible to contract logic while it handles a message.
#[derive(Debug)]
pub struct ReceiveContext<'a> {
    /// Account running the logic.
    pub address: Address,
    /// Balance including the inbound value.
    pub balance: Coins,
    /// Message being handled.
    pub message: &'a Message,
    /// Ledger-wide inputs.
    pub env: &'a ExecutionEnv,
}

/// Side effect requested by contract logic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutAction {
    /// Emit a message. The source address is filled in by the executor.
    SendMessage {
        /// Message to emit.
        message: Message,
        /// Combination of [`send_mode`] flags.
        mode: u8,
    },
}

impl OutAction {
    /// Shorthand for an ordinary send.
    #[must_use]
    pub fn send(message: Message) -> Self {
        Self::SendMessage {
            message,
            mode: send_mode::ORDINARY,
        }
    }
}

/// Logic accepted the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accepted {
    /// New persistent data.
    pub data: Cell,
    /// Requested actions, in order.
    pub actions: Vec<OutAction>,
}

/// Logic did not accept the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Ordinary failure with an exit code; the transaction aborts.
    Exit(i32),
    /// Failure of the executor itself; the drain aborts.
    Fatal(String),
}

/// Contract logic implemented in Rust.
pub trait NativeContract: Send + Sync {
    /// Handles one inbound message given the current persistent data.
    fn receive(&self, ctx: &ReceiveContext<'_>, data: &Cell) -> Result<Accepted, Rejection>;

    /// Answers a get-method. Returns the stack or a failure exit code.
    fn get_method(
        &self,
        _method: &str,
        _args: &[StackValue],
        _data: &Cell,
        _balance: Coins,
    ) -> Result<Vec<StackValue>, i32> {
        Err(exit_codes::METHOD_NOT_FOUND)
    }
}

// =============================================================================
// EXECUTOR
// =============================================================================

/// Executor running registered [`NativeContract`] logic.
#[derive(Default)]
pub struct NativeExecutor {
    contracts: RwLock<HashMap<Hash, Arc<dyn NativeContract>>>,
}

impl NativeExecutor {
    /// Creates an executor with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `logic` to accounts whose code is `code`.
    pub fn register(&self, code: &Cell, logic: Arc<dyn NativeContract>) {
        self.contracts.write().insert(code.hash(), logic);
    }

    /// Returns true if logic is bound to `code`.
    #[must_use]
    pub fn is_registered(&self, code: &Cell) -> bool {
        self.contracts.read().contains_key(&code.hash())
    }

    fn logic_for(&self, code: &Cell) -> Option<Arc<dyn NativeContract>> {
        self.contracts.read().get(&code.hash()).cloned()
    }

    /// Compute and action phases for an active account.
    ///
    /// Returns the exit code; on success `account` holds the committed state
    /// and `out` the emitted messages.
    fn run_active(
        &self,
        account: &mut AccountSnapshot,
        message: &Message,
        env: &ExecutionEnv,
        out: &mut Vec<Message>,
        destroyed: &mut bool,
    ) -> Result<i32, ExecutorError> {
        let Some(state) = account.state.clone() else {
            return Ok(exit_codes::UNKNOWN_CODE);
        };
        let Some(logic) = self.logic_for(&state.code) else {
            return Ok(exit_codes::UNKNOWN_CODE);
        };

        let ctx = ReceiveContext {
            address: account.address,
            balance: account.balance,
            message,
            env,
        };
        let accepted = match logic.receive(&ctx, &state.data) {
            Ok(accepted) => accepted,
            Err(Rejection::Exit(code)) => return Ok(code),
            Err(Rejection::Fatal(reason)) => return Err(ExecutorError::Fatal(reason)),
        };

        let mut remaining = account.balance;
        let mut emitted = Vec::with_capacity(accepted.actions.len());
        let mut destroy = false;
        for action in accepted.actions {
            let OutAction::SendMessage { message, mode } = action;
            if env.verbosity >= Verbosity::VmLogsFull {
                trace!(account = %account.address, mode, kind = ?message.kind(), "out action");
            }
            let message = match message.info {
                MessageInfo::Internal {
                    dest,
                    value,
                    bounce,
                    bounced,
                    ..
                } => {
                    let value = if mode & send_mode::CARRY_ALL_BALANCE != 0 {
                        remaining
                    } else {
                        value
                    };
                    if value > remaining {
                        return Ok(exit_codes::NOT_ENOUGH_BALANCE);
                    }
                    remaining -= value;
                    Message {
                        info: MessageInfo::Internal {
                            src: account.address,
                            dest,
                            value,
                            bounce,
                            bounced,
                        },
                        init: message.init,
                        body: message.body,
                    }
                }
                MessageInfo::ExternalOut { .. } => Message::external_out(account.address, message.body),
                MessageInfo::ExternalIn { .. } => {
                    return Err(ExecutorError::Fatal(
                        "contracts cannot emit inbound external messages".to_string(),
                    ))
                }
            };
            if mode & send_mode::DESTROY_IF_ZERO != 0 && remaining.is_zero() {
                destroy = true;
            }
            emitted.push(message);
        }

        account.balance = remaining;
        if destroy {
            account.status = AccountStatus::NonExisting;
            account.state = None;
            *destroyed = true;
        } else {
            account.state = Some(StateInit::new(state.code, accepted.data));
        }
        out.extend(emitted);
        Ok(exit_codes::SUCCESS)
    }
}

impl std::fmt::Debug for NativeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeExecutor")
            .field("registered", &self.contracts.read().len())
            .finish()
    }
}

/// Body of a bounce: the bounce op followed by the original body.
fn bounce_body(original: &Cell) -> Result<Cell, ExecutorError> {
    Ok(CellBuilder::new()
        .store_u32(BOUNCE_OP)?
        .store_ref(original.clone())?
        .build())
}

#[async_trait]
impl Executor for NativeExecutor {
    async fn run_transaction(
        &self,
        account: &AccountSnapshot,
        message: &Message,
        env: &ExecutionEnv,
    ) -> Result<TransactionOutcome, ExecutorError> {
        let mut next = account.clone();
        let (src, value, bounce) = match message.info {
            MessageInfo::Internal {
                src, value, bounce, ..
            } => (Some(src), value, bounce),
            _ => (None, Coins::zero(), false),
        };

        // credit
        next.balance += value;
        if next.status == AccountStatus::NonExisting && !value.is_zero() {
            next.status = AccountStatus::Uninit;
        }

        // deploy
        let mut bad_state = false;
        if next.status != AccountStatus::Active {
            if let Some(init) = &message.init {
                if init.address(next.address.workchain) == next.address {
                    next.status = AccountStatus::Active;
                    next.state = Some(init.clone());
                } else {
                    bad_state = true;
                }
            }
        }

        // compute + action
        let credited = next.clone();
        let mut out_messages = Vec::new();
        let mut destroyed = false;
        let compute = if next.status == AccountStatus::Active {
            let exit_code =
                self.run_active(&mut next, message, env, &mut out_messages, &mut destroyed)?;
            ComputePhase::Executed {
                success: exit_code == exit_codes::SUCCESS,
                exit_code,
            }
        } else {
            ComputePhase::Skipped {
                reason: if bad_state {
                    SkipReason::BadState
                } else {
                    SkipReason::NoState
                },
            }
        };
        let aborted = !matches!(compute, ComputePhase::Executed { success: true, .. });

        if env.verbosity >= Verbosity::VmLogs {
            debug!(
                account = %account.address,
                lt = %env.lt,
                compute = ?compute,
                out = out_messages.len(),
                "transaction computed"
            );
        }

        if aborted {
            if src.is_none() {
                let exit_code = match compute {
                    ComputePhase::Executed { exit_code, .. } => exit_code,
                    ComputePhase::Skipped { .. } => exit_codes::UNKNOWN_CODE,
                };
                return Err(ExecutorError::ExternalNotAccepted {
                    address: account.address,
                    exit_code,
                });
            }
            // roll back to the credited state, dropping emitted messages
            next = credited;
            out_messages.clear();
            destroyed = false;
        }

        let mut bounced = false;
        if let (true, true, Some(src)) = (aborted, bounce, src) {
            let returned = value.min(next.balance);
            next.balance -= returned;
            let mut bounce_msg = Message::internal(
                next.address,
                src,
                returned,
                false,
                bounce_body(&message.body)?,
            );
            if let MessageInfo::Internal { bounced, .. } = &mut bounce_msg.info {
                *bounced = true;
            }
            out_messages.push(bounce_msg);
            bounced = true;

            if account.status == AccountStatus::NonExisting
                && next.status == AccountStatus::Uninit
                && next.balance.is_zero()
            {
                next.status = AccountStatus::NonExisting;
            }
        }

        Ok(TransactionOutcome {
            account: next,
            out_messages,
            description: TransactionDescription {
                compute,
                aborted,
                destroyed,
                bounced,
            },
        })
    }

    async fn run_get_method(
        &self,
        account: &AccountSnapshot,
        method: &str,
        args: &[StackValue],
        env: &ExecutionEnv,
    ) -> Result<GetMethodResult, ExecutorError> {
        let state = match (&account.state, account.status) {
            (Some(state), AccountStatus::Active) => state,
            _ => return Err(ExecutorError::InactiveAccount(account.address)),
        };
        let logic = self
            .logic_for(&state.code)
            .ok_or_else(|| ExecutorError::UnknownCode(state.code.hash()))?;

        let result = match logic.get_method(method, args, &state.data, account.balance) {
            Ok(stack) => GetMethodResult {
                exit_code: exit_codes::SUCCESS,
                stack,
            },
            Err(exit_code) => GetMethodResult {
                exit_code,
                stack: Vec::new(),
            },
        };
        if env.verbosity >= Verbosity::VmLogs {
            debug!(account = %account.address, method, exit_code = result.exit_code, "get-method");
        }
        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
