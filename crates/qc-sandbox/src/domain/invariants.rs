//! # Domain Invariants
//!
//! Properties every drain result must satisfy. Checked in debug builds after
//! each drain and by the integration tests.
//!
//! - INVARIANT-1: each transaction's logical time is exactly one clock step
//!   after the previous one.
//! - INVARIANT-2: no external-out message is ever delivered.

use crate::domain::entities::{MessageKind, Transaction};
use crate::domain::value_objects::LogicalTime;

/// A broken drain invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Two consecutive transactions are not one step apart.
    LogicalTimeGap {
        /// Stamp of the earlier transaction.
        previous: LogicalTime,
        /// Stamp of the later transaction.
        current: LogicalTime,
    },
    /// A transaction was produced for an external-out message.
    ExternalOutDelivered {
        /// Stamp of the offending transaction.
        lt: LogicalTime,
    },
}

/// INVARIANT-1: consecutive transactions are separated by exactly `step`.
#[must_use]
pub fn check_logical_time_invariant(txs: &[Transaction], step: u64) -> Option<InvariantViolation> {
    txs.windows(2).find_map(|pair| {
        let (previous, current) = (pair[0].lt, pair[1].lt);
        (previous.0.checked_add(step) != Some(current.0))
            .then_some(InvariantViolation::LogicalTimeGap { previous, current })
    })
}

/// INVARIANT-2: no delivered message is external-out.
#[must_use]
pub fn check_no_external_out_invariant(txs: &[Transaction]) -> Option<InvariantViolation> {
    txs.iter()
        .find(|tx| tx.in_message.kind() == MessageKind::ExternalOut)
        .map(|tx| InvariantViolation::ExternalOutDelivered { lt: tx.lt })
}

/// Runs all checks, returning every violation found.
#[must_use]
pub fn check_all_invariants(txs: &[Transaction], step: u64) -> Vec<InvariantViolation> {
    [
        check_logical_time_invariant(txs, step),
        check_no_external_out_invariant(txs),
    ]
    .into_iter()
    .flatten()
    .collect()
}
