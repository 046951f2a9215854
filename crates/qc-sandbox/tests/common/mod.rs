//! Shared fixtures for the sandbox integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use qc_sandbox::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// =============================================================================
// TRACING
// =============================================================================

/// Installs a test subscriber once; `RUST_LOG` controls the filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// ROUTER CONTRACT
// =============================================================================

/// Code shared by every router node.
pub fn router_code() -> Cell {
    CellBuilder::new().store_bytes(b"router").unwrap().build()
}

/// Init of router node `tag`. Distinct tags give distinct addresses.
pub fn node(tag: u8) -> StateInit {
    StateInit::new(router_code(), CellBuilder::new().store_u8(tag).unwrap().build())
}

/// Forwards every inbound message to a fixed list of nodes, deploying them
/// on the way.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Address, Vec<StateInit>>,
    loud: HashSet<Address>,
    fatal: HashSet<Address>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// `from` forwards to each of `to`, in order.
    pub fn route(mut self, from: &StateInit, to: &[&StateInit]) -> Self {
        self.routes
            .insert(from.address(0), to.iter().map(|s| (*s).clone()).collect());
        self
    }

    /// `at` also emits one external-out message before forwarding.
    pub fn loud(mut self, at: &StateInit) -> Self {
        self.loud.insert(at.address(0));
        self
    }

    /// `at` fails the executor instead of handling the message.
    pub fn fatal(mut self, at: &StateInit) -> Self {
        self.fatal.insert(at.address(0));
        self
    }

    /// Registers this router on `executor`.
    pub fn install(self, executor: &NativeExecutor) {
        executor.register(&router_code(), Arc::new(self));
    }
}

impl NativeContract for Router {
    fn receive(&self, ctx: &ReceiveContext<'_>, data: &Cell) -> Result<Accepted, Rejection> {
        if self.fatal.contains(&ctx.address) {
            return Err(Rejection::Fatal(format!("router {} failed", ctx.address)));
        }

        let mut actions = Vec::new();
        if self.loud.contains(&ctx.address) {
            actions.push(OutAction::send(Message::external_out(
                ctx.address,
                Cell::empty(),
            )));
        }
        for target in self.routes.get(&ctx.address).into_iter().flatten() {
            actions.push(OutAction::send(
                Message::internal(
                    ctx.address,
                    target.address(0),
                    Coins::zero(),
                    false,
                    Cell::empty(),
                )
                .with_init(Some(target.clone())),
            ));
        }
        Ok(Accepted {
            data: data.clone(),
            actions,
        })
    }

    fn get_method(
        &self,
        method: &str,
        _args: &[StackValue],
        data: &Cell,
        _balance: Coins,
    ) -> Result<Vec<StackValue>, i32> {
        match method {
            "tag" => Ok(vec![StackValue::Int(Coins::from(data.data()[0]))]),
            _ => Err(11),
        }
    }
}

/// Blockchain with default settings and `router` installed.
pub fn chain_with(router: Router) -> Blockchain {
    chain_with_settings(SandboxConfig::default(), router)
}

/// Blockchain with `settings` and `router` installed.
pub fn chain_with_settings(settings: SandboxConfig, router: Router) -> Blockchain {
    let chain = Blockchain::create(settings, None).unwrap();
    router.install(&chain.native_executor().unwrap());
    chain
}

/// Zero-value, non-bounceable root message deploying and poking `target`.
pub fn poke(target: &StateInit) -> Message {
    Message::internal(
        Address::new(0, Hash::new([0xEE; 32])),
        target.address(0),
        Coins::zero(),
        false,
        Cell::empty(),
    )
    .with_init(Some(target.clone()))
}

/// Destinations of `txs`, in delivery order.
pub fn destinations(txs: &[Transaction]) -> Vec<Address> {
    txs.iter().map(|tx| tx.account).collect()
}

// =============================================================================
// FAILING STORE
// =============================================================================

/// Local store that refuses to hand out one account.
pub struct FlakyStore {
    inner: LocalAccountStore,
    poisoned: Address,
}

impl FlakyStore {
    pub fn new(executor: Arc<NativeExecutor>, poisoned: Address) -> Self {
        Self {
            inner: LocalAccountStore::new(executor),
            poisoned,
        }
    }
}

#[async_trait]
impl AccountStore for FlakyStore {
    async fn get_account(&self, address: Address) -> Result<SharedAccount, AccountError> {
        if address == self.poisoned {
            return Err(AccountError::Store(format!("{address} unavailable")));
        }
        self.inner.get_account(address).await
    }

    async fn known_accounts(&self) -> Vec<Address> {
        self.inner.known_accounts().await
    }
}
