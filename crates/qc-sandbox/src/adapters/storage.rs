//! # Local Account Store
//!
//! In-memory account storage. Accounts are created lazily on first lookup
//! and live for the lifetime of the store.

use crate::adapters::account::SandboxAccount;
use crate::domain::value_objects::Address;
use crate::errors::AccountError;
use crate::ports::outbound::{AccountHandle, AccountStore, Executor, SharedAccount};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory account store.
pub struct LocalAccountStore {
    accounts: RwLock<BTreeMap<Address, SharedAccount>>,
    executor: Arc<dyn Executor>,
}

impl LocalAccountStore {
    /// Creates an empty store whose accounts run on `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            executor,
        }
    }

    /// Number of accounts created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// Returns true if no account has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

#[async_trait]
impl AccountStore for LocalAccountStore {
    async fn get_account(&self, address: Address) -> Result<SharedAccount, AccountError> {
        if let Some(account) = self.accounts.read().get(&address) {
            return Ok(Arc::clone(account));
        }

        let mut accounts = self.accounts.write();
        let account = accounts.entry(address).or_insert_with(|| {
            let handle: Box<dyn AccountHandle> =
                Box::new(SandboxAccount::new(address, Arc::clone(&self.executor)));
            Arc::new(Mutex::new(handle))
        });
        Ok(Arc::clone(account))
    }

    async fn known_accounts(&self) -> Vec<Address> {
        self.accounts.read().keys().copied().collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::executor::NativeExecutor;
    use crate::domain::entities::AccountStatus;
    use crate::domain::value_objects::{Coins, Hash};

    fn store() -> LocalAccountStore {
        LocalAccountStore::new(Arc::new(NativeExecutor::new()))
    }

    #[tokio::test]
    async fn test_lazy_creation() {
        let store = store();
        assert!(store.is_empty());

        let addr = Address::new(0, Hash::new([1u8; 32]));
        let account = store.get_account(addr).await.unwrap();
        let snapshot = account.lock().await.snapshot();
        assert_eq!(snapshot.address, addr);
        assert_eq!(snapshot.status, AccountStatus::NonExisting);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_account_is_idempotent() {
        let store = store();
        let addr = Address::new(0, Hash::new([2u8; 32]));

        let a = store.get_account(addr).await.unwrap();
        a.lock().await.set_balance(Coins::from(99u64));

        let b = store.get_account(addr).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.lock().await.snapshot().balance, Coins::from(99u64));
        assert_eq!(store.known_accounts().await, vec![addr]);
    }
}
