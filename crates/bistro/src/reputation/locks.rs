use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::domain::AccountId;

/// Registry handing out one mutex per account so read-evaluate-write sequences never interleave.
#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    /// Collect the locks for `accounts`, sorted and deduplicated so every caller acquires them
    /// in the same order.
    pub fn scope<'a, I>(&self, accounts: I) -> LockScope
    where
        I: IntoIterator<Item = &'a AccountId>,
    {
        let mut ids: Vec<&AccountId> = accounts.into_iter().collect();
        ids.sort();
        ids.dedup();

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let handles = ids
            .into_iter()
            .map(|id| Arc::clone(slots.entry(id.clone()).or_default()))
            .collect();

        LockScope { handles }
    }
}

/// Set of account locks that are held together while a guard list is alive.
pub struct LockScope {
    handles: Vec<Arc<Mutex<()>>>,
}

impl LockScope {
    /// The guarded data is `()`, so a poisoned lock carries no broken state and is reclaimed.
    pub fn enter(&self) -> Vec<MutexGuard<'_, ()>> {
        self.handles
            .iter()
            .map(|handle| handle.lock().unwrap_or_else(PoisonError::into_inner))
            .collect()
    }
}
