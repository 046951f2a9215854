//! # Drain Semantics Tests
//!
//! End-to-end checks of the execution loop through `Blockchain`.
//!
//! ## Test Categories
//!
//! 1. **Logical Time** - one step per delivery, never reused
//! 2. **Ordering** - FIFO, breadth-first causal expansion
//! 3. **External-Out** - rejected at submission, dropped on dequeue
//! 4. **Fail-Fast** - account failures abort the drain, queue stays inspectable
//! 5. **Diagnostics** - verbosity never changes output

mod common;

use common::*;
use qc_sandbox::prelude::*;
use std::sync::Arc;

// =============================================================================
// LOGICAL TIME
// =============================================================================

#[tokio::test]
async fn test_two_hop_scenario() {
    init_tracing();
    let (a, b) = (node(1), node(2));
    let chain = chain_with(Router::new().route(&a, &[&b]));

    let res = chain.send_message(poke(&a)).await.unwrap();

    assert_eq!(res.transactions.len(), 2);
    assert_eq!(destinations(&res.transactions), vec![a.address(0), b.address(0)]);
    let step = chain.settings().lt_step;
    assert_eq!(res.transactions[0].lt, LogicalTime(step));
    assert_eq!(res.transactions[1].lt, LogicalTime(2 * step));
}

#[tokio::test]
async fn test_logical_time_strictly_increases_across_sends() {
    init_tracing();
    let (a, b, c) = (node(1), node(2), node(3));
    let settings = SandboxConfig::default().with_lt_step(7);
    let chain = chain_with_settings(settings, Router::new().route(&a, &[&b, &c]));

    let mut all = Vec::new();
    for _ in 0..3 {
        all.extend(chain.send_message(poke(&a)).await.unwrap().transactions);
    }

    assert_eq!(all.len(), 9);
    assert!(check_all_invariants(&all, 7).is_empty());
    for (i, tx) in all.iter().enumerate() {
        assert_eq!(tx.lt, LogicalTime(7 * (i as u64 + 1)));
    }
    assert_eq!(chain.lt(), LogicalTime(63));
    assert_eq!(chain.stats().transactions_executed, 9);
}

#[tokio::test]
async fn test_largest_clock_step_keeps_stamps_distinct() {
    let (a, b) = (node(1), node(2));
    let settings = SandboxConfig::default().with_lt_step(MAX_LT_STEP);
    let chain = chain_with_settings(settings, Router::new().route(&a, &[&b]));

    let res = chain.send_message(poke(&a)).await.unwrap();

    assert_eq!(res.transactions[0].lt, LogicalTime(MAX_LT_STEP));
    assert_eq!(res.transactions[1].lt, LogicalTime(2 * MAX_LT_STEP));
    assert!(check_all_invariants(&res.transactions, MAX_LT_STEP).is_empty());

    assert!(matches!(
        Blockchain::create(SandboxConfig::default().with_lt_step(u64::MAX), None),
        Err(SandboxError::Config(ConfigError::InvalidValue { field: "lt_step", .. }))
    ));
}

// =============================================================================
// ORDERING
// =============================================================================

#[tokio::test]
async fn test_breadth_first_expansion() {
    init_tracing();
    let (root, m1, m2, c1, c2) = (node(1), node(2), node(3), node(4), node(5));
    let chain = chain_with(
        Router::new()
            .route(&root, &[&m1, &m2])
            .route(&m1, &[&c1])
            .route(&m2, &[&c2]),
    );

    let res = chain.send_message(poke(&root)).await.unwrap();

    let expected: Vec<Address> = [&root, &m1, &m2, &c1, &c2]
        .iter()
        .map(|s| s.address(0))
        .collect();
    assert_eq!(destinations(&res.transactions), expected);

    let created: Vec<Address> = res
        .events
        .iter()
        .filter_map(|e| match e {
            Event::AccountCreated { account } => Some(*account),
            _ => None,
        })
        .collect();
    assert_eq!(created, expected);
    assert!(chain.pending_messages().is_empty());
}

#[tokio::test]
async fn test_events_follow_transaction_order() {
    let (a, b) = (node(1), node(2));
    let chain = chain_with(Router::new().route(&a, &[&b]));

    let res = chain.send_message(poke(&a)).await.unwrap();

    assert_eq!(
        res.events,
        vec![
            Event::AccountCreated {
                account: a.address(0)
            },
            Event::MessageSent {
                from: a.address(0),
                to: b.address(0),
                value: Coins::zero(),
                body: Cell::empty(),
                bounced: false,
            },
            Event::AccountCreated {
                account: b.address(0)
            },
        ]
    );
}

// =============================================================================
// EXTERNAL-OUT
// =============================================================================

#[tokio::test]
async fn test_external_out_submission_rejected() {
    let chain = chain_with(Router::new());
    let err = chain
        .send_message(Message::external_out(node(1).address(0), Cell::empty()))
        .await
        .unwrap_err();

    assert!(matches!(err, SandboxError::InvalidMessageKind));
    assert!(err.is_validation());
    assert!(chain.pending_messages().is_empty());
    assert_eq!(chain.lt(), LogicalTime::ZERO);
    assert!(matches!(
        chain.push_message(Message::external_out(node(1).address(0), Cell::empty())),
        Err(SandboxError::InvalidMessageKind)
    ));
}

#[tokio::test]
async fn test_emitted_external_out_is_discarded() {
    init_tracing();
    let (a, b) = (node(1), node(2));
    let chain = chain_with(Router::new().route(&a, &[&b]).loud(&a));

    let res = chain.send_message(poke(&a)).await.unwrap();

    // the external-out sits between the two deliveries but takes no time
    assert_eq!(res.transactions.len(), 2);
    assert_eq!(res.transactions[0].out_messages.len(), 2);
    assert_eq!(
        res.transactions[0].out_messages[0].kind(),
        MessageKind::ExternalOut
    );
    let step = chain.settings().lt_step;
    assert_eq!(res.transactions[1].lt.0 - res.transactions[0].lt.0, step);
    assert_eq!(chain.stats().messages_discarded, 1);
    // only internal messages produce events
    assert_eq!(
        res.events
            .iter()
            .filter(|e| matches!(e, Event::MessageSent { .. }))
            .count(),
        1
    );
}

// =============================================================================
// FAIL-FAST
// =============================================================================

#[tokio::test]
async fn test_store_failure_aborts_and_leaves_queue() {
    init_tracing();
    let (root, m1, m2) = (node(1), node(2), node(3));
    let executor = Arc::new(NativeExecutor::new());
    Router::new()
        .route(&root, &[&m1, &m2])
        .install(&executor);
    let store = Arc::new(FlakyStore::new(executor, m1.address(0)));
    let chain = Blockchain::with_store(store, SandboxConfig::default(), None).unwrap();

    let err = chain.send_message(poke(&root)).await.unwrap_err();

    assert!(matches!(err, SandboxError::Account(AccountError::Store(_))));
    assert!(!err.is_validation());
    let pending = chain.pending_messages();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].destination(), Some(m2.address(0)));
    assert_eq!(chain.stats().drains_aborted, 1);

    // the failed message is gone; resuming delivers the rest
    let resumed = chain.run_queue().await.unwrap();
    assert_eq!(destinations(&resumed.transactions), vec![m2.address(0)]);
    assert!(chain.pending_messages().is_empty());
}

#[tokio::test]
async fn test_fatal_executor_failure_propagates() {
    let (root, m1, m2) = (node(1), node(2), node(3));
    let chain = chain_with(Router::new().route(&root, &[&m1, &m2]).fatal(&m1));

    let err = chain.send_message(poke(&root)).await.unwrap_err();

    assert!(matches!(
        err,
        SandboxError::Account(AccountError::Executor(ExecutorError::Fatal(_)))
    ));
    assert_eq!(chain.pending_messages().len(), 1);
    assert_eq!(chain.clear_queue(), 1);
    assert!(chain.pending_messages().is_empty());
    // the instance stays usable
    assert!(chain.run_queue().await.unwrap().transactions.is_empty());
}

#[tokio::test]
async fn test_queue_limit() {
    let (root, m1, m2) = (node(1), node(2), node(3));
    let settings = SandboxConfig::default().with_max_queue_length(1);
    let chain = chain_with_settings(settings, Router::new().route(&root, &[&m1, &m2]));

    let err = chain.send_message(poke(&root)).await.unwrap_err();
    assert!(matches!(err, SandboxError::QueueFull { limit: 1 }));

    // the root transaction ran and is counted; none of its outputs were queued
    assert!(chain.pending_messages().is_empty());
    assert_eq!(chain.stats().transactions_executed, 1);
    assert_eq!(chain.stats().drains_aborted, 1);
    assert!(chain.get_contract(root.address(0)).await.unwrap().is_active());
    assert!(!chain.get_contract(m1.address(0)).await.unwrap().is_active());
    assert!(!chain.get_contract(m2.address(0)).await.unwrap().is_active());
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

#[tokio::test]
async fn test_verbosity_does_not_change_output() {
    init_tracing();
    let (a, b, c) = (node(1), node(2), node(3));
    let router = || Router::new().route(&a, &[&b, &c]).loud(&b);

    let quiet = chain_with(router());
    let noisy = chain_with(router());
    noisy.set_verbosity(Verbosity::VmLogsFull);
    noisy
        .set_verbosity_for_address(b.address(0), Verbosity::VmLogs)
        .await
        .unwrap();

    let q = quiet.send_message(poke(&a)).await.unwrap();
    let n = noisy.send_message(poke(&a)).await.unwrap();
    assert_eq!(q, n);

    noisy.reset_verbosity_for_address(b.address(0)).await.unwrap();
    assert_eq!(
        quiet.send_message(poke(&a)).await.unwrap(),
        noisy.send_message(poke(&a)).await.unwrap()
    );
}

#[tokio::test]
async fn test_network_config_replaced_wholesale() {
    let chain = chain_with(Router::new());
    assert_eq!(chain.config(), NetworkConfig::default());

    let cfg = NetworkConfig::new(CellBuilder::new().store_u64(42).unwrap().build());
    chain.set_config(cfg.clone());
    assert_eq!(chain.config(), cfg);
}
