//! # Blockchain Service
//!
//! The simulator itself. Owns the logical clock and the message queue,
//! drains the queue through the account store and opens contract handles.
//!
//! ## Drain Semantics
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | FIFO delivery, out messages appended to the tail | `Blockchain::drain_into` |
//! | Clock advances one step before each delivery | `Blockchain::next_delivery` |
//! | External-out messages dropped on dequeue, no clock tick | `Blockchain::next_delivery` |
//! | Account failures abort the drain unchanged | `Blockchain::drain` |
//! | A transaction's out messages are queued all together or not at all | `Blockchain::drain_into` |
//! | One drain per instance at a time | `DrainGuard` |
//!
//! After an aborted drain the queue holds whatever was left when the failure
//! happened. Inspect it with [`Blockchain::pending_messages`], resume with
//! [`Blockchain::run_queue`] or drop it with [`Blockchain::clear_queue`].

use crate::adapters::event_extractor::DefaultEventExtractor;
use crate::adapters::executor::NativeExecutor;
use crate::adapters::provider::{BlockchainContractProvider, BlockchainSender};
use crate::adapters::storage::LocalAccountStore;
use crate::adapters::treasury::{treasury_code, TreasuryContract, TreasuryLogic};
use crate::config::SandboxConfig;
use crate::domain::cell::StateInit;
use crate::domain::clock::LogicalClock;
use crate::domain::entities::{
    AccountSnapshot, GetMethodResult, Message, MessageKind, NetworkConfig, SendMessageResult,
    SendResult, StackValue, Verbosity,
};
use crate::domain::invariants::check_all_invariants;
use crate::domain::queue::MessageQueue;
use crate::domain::services::test_key;
use crate::domain::value_objects::{Address, Coins, LogicalTime};
use crate::errors::SandboxError;
use crate::ports::inbound::{Contract, MutationMethod, QueryMethod};
use crate::ports::outbound::{AccountStore, EventExtractor, ExecutionEnv};

use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

/// Counters over the lifetime of a blockchain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockchainStats {
    /// Transactions produced.
    pub transactions_executed: u64,
    /// External-out messages dropped on dequeue.
    pub messages_discarded: u64,
    /// Drains that reached an empty queue.
    pub drains_completed: u64,
    /// Drains cut short by a failure.
    pub drains_aborted: u64,
}

/// Mutable ledger state. Never locked across an `.await`.
struct LedgerState {
    clock: LogicalClock,
    queue: MessageQueue,
    network_config: NetworkConfig,
    verbosity: Verbosity,
}

struct Inner {
    settings: SandboxConfig,
    store: Arc<dyn AccountStore>,
    extractor: Arc<dyn EventExtractor>,
    native: Option<Arc<NativeExecutor>>,
    ledger: Mutex<LedgerState>,
    draining: AtomicBool,
    stats: Mutex<BlockchainStats>,
}

/// Marks a drain as running; released on drop, including on error paths.
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SandboxError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SandboxError::DrainInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// BLOCKCHAIN
// =============================================================================

/// Deterministic single-process ledger simulator.
///
/// Cheap to clone; clones share one ledger. Providers, senders and opened
/// contracts each hold a clone.
#[derive(Clone)]
pub struct Blockchain {
    inner: Arc<Inner>,
}

impl Blockchain {
    /// Creates a simulator backed by an in-memory store and the native
    /// executor, with the treasury wallet logic registered.
    pub fn create(
        settings: SandboxConfig,
        network: Option<NetworkConfig>,
    ) -> Result<Self, SandboxError> {
        let native = Arc::new(NativeExecutor::new());
        native.register(&treasury_code(), Arc::new(TreasuryLogic));
        let store = Arc::new(LocalAccountStore::new(native.clone()));
        Self::build(
            settings,
            network,
            store,
            Arc::new(DefaultEventExtractor),
            Some(native),
        )
    }

    /// Creates a simulator on top of a caller-supplied account store.
    pub fn with_store(
        store: Arc<dyn AccountStore>,
        settings: SandboxConfig,
        network: Option<NetworkConfig>,
    ) -> Result<Self, SandboxError> {
        Self::with_parts(store, Arc::new(DefaultEventExtractor), settings, network)
    }

    /// Creates a simulator from a custom store and event extractor.
    pub fn with_parts(
        store: Arc<dyn AccountStore>,
        extractor: Arc<dyn EventExtractor>,
        settings: SandboxConfig,
        network: Option<NetworkConfig>,
    ) -> Result<Self, SandboxError> {
        Self::build(settings, network, store, extractor, None)
    }

    fn build(
        settings: SandboxConfig,
        network: Option<NetworkConfig>,
        store: Arc<dyn AccountStore>,
        extractor: Arc<dyn EventExtractor>,
        native: Option<Arc<NativeExecutor>>,
    ) -> Result<Self, SandboxError> {
        settings.validate()?;
        info!(
            lt_step = settings.lt_step,
            max_queue_length = settings.max_queue_length,
            "creating blockchain"
        );

        let ledger = LedgerState {
            clock: LogicalClock::new(settings.lt_step),
            queue: MessageQueue::with_limit(settings.max_queue_length),
            network_config: network.unwrap_or_default(),
            verbosity: settings.verbosity,
        };
        Ok(Self {
            inner: Arc::new(Inner {
                settings,
                store,
                extractor,
                native,
                ledger: Mutex::new(ledger),
                draining: AtomicBool::new(false),
                stats: Mutex::new(BlockchainStats::default()),
            }),
        })
    }

    // -------------------------------------------------------------------------
    // Execution loop
    // -------------------------------------------------------------------------

    /// Enqueues `message` and drains the queue to a fixed point.
    ///
    /// # Errors
    ///
    /// - `InvalidMessageKind` for external-out messages; the queue is untouched.
    /// - `DrainInProgress` if another drain is running on this instance.
    /// - Any account store failure, verbatim. The drain stops there.
    #[instrument(skip(self, message), fields(kind = ?message.kind()))]
    pub async fn send_message(&self, message: Message) -> Result<SendMessageResult, SandboxError> {
        let _guard = DrainGuard::acquire(&self.inner.draining)?;
        self.push_message(message)?;
        self.drain().await
    }

    /// Enqueues `message` without draining.
    pub fn push_message(&self, message: Message) -> Result<(), SandboxError> {
        self.inner.ledger.lock().queue.push(message)
    }

    /// Drains whatever is queued, e.g. after an aborted drain.
    #[instrument(skip(self))]
    pub async fn run_queue(&self) -> Result<SendMessageResult, SandboxError> {
        let _guard = DrainGuard::acquire(&self.inner.draining)?;
        self.drain().await
    }

    /// Drains the queue. The caller holds the drain guard.
    async fn drain(&self) -> Result<SendMessageResult, SandboxError> {
        let mut result = SendMessageResult::default();
        match self.drain_into(&mut result).await {
            Ok(()) => {
                self.inner.stats.lock().drains_completed += 1;
                debug_assert!(
                    check_all_invariants(&result.transactions, self.inner.settings.lt_step)
                        .is_empty(),
                    "drain invariants violated"
                );
                info!(
                    transactions = result.transactions.len(),
                    events = result.events.len(),
                    "queue drained"
                );
                Ok(result)
            }
            Err(err) => {
                self.inner.stats.lock().drains_aborted += 1;
                let pending = self.inner.ledger.lock().queue.len();
                warn!(
                    error = %err,
                    delivered = result.transactions.len(),
                    pending,
                    "drain aborted"
                );
                Err(err)
            }
        }
    }

    async fn drain_into(&self, result: &mut SendMessageResult) -> Result<(), SandboxError> {
        while let Some((message, env)) = self.next_delivery()? {
            let destination = message
                .destination()
                .ok_or(SandboxError::InvalidMessageKind)?;
            debug!(lt = %env.lt, %destination, kind = ?message.kind(), "delivering message");

            let account = self.inner.store.get_account(destination).await?;
            let tx = account.lock().await.apply(&message, &env).await?;
            self.inner.stats.lock().transactions_executed += 1;

            let queued = self.inner.ledger.lock().queue.append_all(&tx.out_messages);
            if let Err(err) = queued {
                warn!(
                    lt = %tx.lt,
                    %destination,
                    dropped = tx.out_messages.len(),
                    "out messages do not fit the queue"
                );
                return Err(err);
            }

            result.events.extend(self.inner.extractor.extract(&tx));
            result.transactions.push(tx);
        }
        Ok(())
    }

    /// Pops the next deliverable message and stamps it with a fresh time.
    ///
    /// If the clock cannot advance the message stays at the head.
    fn next_delivery(&self) -> Result<Option<(Message, ExecutionEnv)>, SandboxError> {
        let mut ledger = self.inner.ledger.lock();
        loop {
            let Some(kind) = ledger.queue.front().map(Message::kind) else {
                return Ok(None);
            };
            if kind == MessageKind::ExternalOut {
                if let Some(message) = ledger.queue.pop() {
                    trace!(body = ?message.body, "discarding external-out message");
                }
                self.inner.stats.lock().messages_discarded += 1;
                continue;
            }
            let Some(lt) = ledger.clock.advance() else {
                return Err(SandboxError::ClockExhausted {
                    lt: ledger.clock.now().0,
                });
            };
            let Some(message) = ledger.queue.pop() else {
                return Ok(None);
            };
            let env = ExecutionEnv {
                lt,
                unix_time: self.inner.settings.unix_time,
                config: ledger.network_config.clone(),
                verbosity: ledger.verbosity,
            };
            return Ok(Some((message, env)));
        }
    }

    fn query_env(&self) -> ExecutionEnv {
        let ledger = self.inner.ledger.lock();
        ExecutionEnv {
            lt: ledger.clock.now(),
            unix_time: self.inner.settings.unix_time,
            config: ledger.network_config.clone(),
            verbosity: ledger.verbosity,
        }
    }

    // -------------------------------------------------------------------------
    // Contracts
    // -------------------------------------------------------------------------

    /// Wraps a contract descriptor into a handle bound to this blockchain.
    ///
    /// Validates the address and, if present, the init code and data. Has no
    /// other effect; wrapping the same descriptor twice is harmless.
    #[instrument(skip(self, contract), fields(address = %contract.address()))]
    pub fn open_contract<C: Contract>(&self, contract: C) -> Result<OpenedContract<C>, SandboxError> {
        let address = contract.address();
        if !address.is_well_formed() {
            return Err(SandboxError::InvalidAddress(format!("{address:?}")));
        }
        if let Some(init) = contract.init() {
            init.code.validate().map_err(SandboxError::InvalidInitCode)?;
            init.data.validate().map_err(SandboxError::InvalidInitData)?;
        }
        Ok(OpenedContract {
            chain: self.clone(),
            contract,
        })
    }

    /// Opens the treasury wallet derived from `seed`, funding it if empty.
    pub async fn treasury(
        &self,
        seed: &str,
        workchain: i32,
    ) -> Result<OpenedContract<TreasuryContract>, SandboxError> {
        let treasury = self.open_contract(TreasuryContract::new(workchain, test_key(seed))?)?;
        let address = treasury.address();
        if self.get_contract(address).await?.balance.is_zero() {
            debug!(%address, seed, "funding treasury");
            self.set_balance(address, self.inner.settings.treasury_balance)
                .await?;
        }
        Ok(treasury)
    }

    /// Provider bound to `address`, deploying with `init` if given.
    #[must_use]
    pub fn provider(&self, address: Address, init: Option<StateInit>) -> BlockchainContractProvider {
        BlockchainContractProvider::new(self.clone(), address, init)
    }

    /// Sender emitting internal messages from `address`.
    #[must_use]
    pub fn sender(&self, address: Address) -> BlockchainSender {
        BlockchainSender::new(self.clone(), address)
    }

    /// Snapshot of the account at `address`.
    pub async fn get_contract(&self, address: Address) -> Result<AccountSnapshot, SandboxError> {
        let account = self.inner.store.get_account(address).await?;
        let snapshot = account.lock().await.snapshot();
        Ok(snapshot)
    }

    /// Overwrites the balance of the account at `address`.
    pub async fn set_balance(&self, address: Address, balance: Coins) -> Result<(), SandboxError> {
        let account = self.inner.store.get_account(address).await?;
        account.lock().await.set_balance(balance);
        Ok(())
    }

    /// Runs a get-method on `address` at the current logical time.
    ///
    /// The raw result is returned whatever its exit code.
    pub async fn run_get_method(
        &self,
        address: Address,
        method: &str,
        args: &[StackValue],
    ) -> Result<GetMethodResult, SandboxError> {
        let env = self.query_env();
        let account = self.inner.store.get_account(address).await?;
        let result = account.lock().await.query(method, args, &env).await?;
        Ok(result)
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Current logical time.
    #[must_use]
    pub fn lt(&self) -> LogicalTime {
        self.inner.ledger.lock().clock.now()
    }

    /// Copy of the pending queue, head first.
    #[must_use]
    pub fn pending_messages(&self) -> Vec<Message> {
        self.inner.ledger.lock().queue.snapshot()
    }

    /// Drops every pending message, returning how many were dropped.
    pub fn clear_queue(&self) -> usize {
        let dropped = self.inner.ledger.lock().queue.clear();
        if dropped > 0 {
            debug!(dropped, "queue cleared");
        }
        dropped
    }

    /// Network configuration handed to the executor.
    #[must_use]
    pub fn config(&self) -> NetworkConfig {
        self.inner.ledger.lock().network_config.clone()
    }

    /// Replaces the network configuration wholesale.
    pub fn set_config(&self, config: NetworkConfig) {
        self.inner.ledger.lock().network_config = config;
    }

    /// Settings this instance was created with.
    #[must_use]
    pub fn settings(&self) -> &SandboxConfig {
        &self.inner.settings
    }

    /// Global executor verbosity.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.inner.ledger.lock().verbosity
    }

    /// Sets the global executor verbosity.
    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.inner.ledger.lock().verbosity = verbosity;
    }

    /// Overrides the verbosity of one account.
    pub async fn set_verbosity_for_address(
        &self,
        address: Address,
        verbosity: Verbosity,
    ) -> Result<(), SandboxError> {
        let account = self.inner.store.get_account(address).await?;
        account.lock().await.set_verbosity(Some(verbosity));
        Ok(())
    }

    /// Removes the verbosity override of one account.
    pub async fn reset_verbosity_for_address(&self, address: Address) -> Result<(), SandboxError> {
        let account = self.inner.store.get_account(address).await?;
        account.lock().await.set_verbosity(None);
        Ok(())
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> BlockchainStats {
        self.inner.stats.lock().clone()
    }

    /// Executor used by [`Blockchain::create`], for registering contract logic.
    /// `None` when the simulator runs on a caller-supplied store.
    #[must_use]
    pub fn native_executor(&self) -> Option<Arc<NativeExecutor>> {
        self.inner.native.clone()
    }
}

impl std::fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ledger = self.inner.ledger.lock();
        f.debug_struct("Blockchain")
            .field("lt", &ledger.clock.now())
            .field("pending", &ledger.queue.len())
            .field("verbosity", &ledger.verbosity)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// OPENED CONTRACT
// =============================================================================

/// A contract descriptor bound to a blockchain.
///
/// Query methods run against a read-only provider and never touch the queue.
/// Mutation methods run against a message-composing provider; the queue is
/// then drained and the resulting transactions and events returned with the
/// method's own result. Everything else on `C` is reachable through `Deref`.
#[derive(Clone, Debug)]
pub struct OpenedContract<C> {
    chain: Blockchain,
    contract: C,
}

impl<C: Contract> OpenedContract<C> {
    /// The wrapped descriptor.
    #[must_use]
    pub fn contract(&self) -> &C {
        &self.contract
    }

    /// Contract address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// The blockchain this handle is bound to.
    #[must_use]
    pub fn blockchain(&self) -> &Blockchain {
        &self.chain
    }

    /// Provider bound to this contract's address and init.
    #[must_use]
    pub fn provider(&self) -> BlockchainContractProvider {
        self.chain
            .provider(self.contract.address(), self.contract.init().cloned())
    }

    /// Runs a query method.
    pub async fn get<Q: QueryMethod<C>>(&self, method: Q) -> Result<Q::Output, SandboxError> {
        let provider = self.provider();
        method.query(&self.contract, &provider).await
    }

    /// Runs a mutation method, then drains the queue.
    ///
    /// A mutation that enqueues nothing still drains and returns empty
    /// transactions and events.
    pub async fn send<M: MutationMethod<C>>(
        &self,
        method: M,
    ) -> Result<SendResult<M::Output>, SandboxError> {
        let _guard = DrainGuard::acquire(&self.chain.inner.draining)?;
        let provider = self.provider();
        let result = method.mutate(&self.contract, &provider).await?;
        let drained = self.chain.drain().await?;
        Ok(SendResult::new(result, drained))
    }
}

impl<C> Deref for OpenedContract<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.contract
    }
}

// =============================================================================
// TESTS
// =============================================================================
