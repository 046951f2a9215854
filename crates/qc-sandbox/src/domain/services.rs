//! # Domain Services
//!
//! Pure functions over domain entities.

use crate::domain::entities::{AccountStatus, Event, MessageInfo, Transaction};
use crate::domain::value_objects::Hash;
use sha2::{Digest, Sha256};

/// Derives the events a transaction's effects imply.
///
/// Order: account creation, account destruction, then one `MessageSent` per
/// internal out message in emission order.
#[must_use]
pub fn extract_events(tx: &Transaction) -> Vec<Event> {
    let mut events = Vec::new();

    if tx.old_status != AccountStatus::Active && tx.end_status == AccountStatus::Active {
        events.push(Event::AccountCreated {
            account: tx.account,
        });
    }

    if tx.old_status != AccountStatus::NonExisting
        && tx.end_status == AccountStatus::NonExisting
    {
        events.push(Event::AccountDestroyed {
            account: tx.account,
        });
    }

    for message in &tx.out_messages {
        if let MessageInfo::Internal {
            src,
            dest,
            value,
            bounced,
            ..
        } = message.info
        {
            events.push(Event::MessageSent {
                from: src,
                to: dest,
                value,
                body: message.body.clone(),
                bounced,
            });
        }
    }

    events
}

/// Deterministic key material for a test wallet derived from a seed string.
#[must_use]
pub fn test_key(seed: &str) -> Hash {
    Hash::new(Sha256::digest(seed.as_bytes()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Cell;
    use crate::domain::entities::{ComputePhase, Message, TransactionDescription};
    use crate::domain::value_objects::{Address, Coins, LogicalTime};

    fn addr(b: u8) -> Address {
        Address::new(0, Hash::new([b; 32]))
    }

    fn tx(old: AccountStatus, end: AccountStatus, out: Vec<Message>) -> Transaction {
        Transaction {
            lt: LogicalTime(1),
            account: addr(1),
            in_message: Message::external_in(addr(1), Cell::empty()),
            out_messages: out,
            old_status: old,
            end_status: end,
            balance_after: Coins::zero(),
            state_hash: Hash::ZERO,
            description: TransactionDescription {
                compute: ComputePhase::Executed {
                    success: true,
                    exit_code: 0,
                },
                aborted: false,
                destroyed: false,
                bounced: false,
            },
        }
    }

    #[test]
    fn test_account_created() {
        let events = extract_events(&tx(AccountStatus::Uninit, AccountStatus::Active, vec![]));
        assert_eq!(events, vec![Event::AccountCreated { account: addr(1) }]);
    }

    #[test]
    fn test_account_destroyed() {
        let events = extract_events(&tx(
            AccountStatus::Active,
            AccountStatus::NonExisting,
            vec![],
        ));
        assert_eq!(events, vec![Event::AccountDestroyed { account: addr(1) }]);
    }

    #[test]
    fn test_message_sent_skips_external_out() {
        let out = vec![
            Message::internal(addr(1), addr(2), Coins::from(3u64), false, Cell::empty()),
            Message::external_out(addr(1), Cell::empty()),
            Message::internal(addr(1), addr(3), Coins::from(4u64), true, Cell::empty()),
        ];
        let events = extract_events(&tx(AccountStatus::Active, AccountStatus::Active, out));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::MessageSent { to, .. } if to == addr(2)));
        assert!(matches!(events[1], Event::MessageSent { to, .. } if to == addr(3)));
    }

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(test_key("alice"), test_key("alice"));
        assert_ne!(test_key("alice"), test_key("bob"));
    }
}
