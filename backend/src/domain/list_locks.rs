//! Per-list mutation serialisation.
//!
//! Every list mutation holds the list's lock from its authorisation check
//! through commit and publication. That gives at most one in-flight claim
//! transition per item and makes the order events reach the topic equal to
//! commit order. Locks are created on demand and forgotten once no holder or
//! waiter references them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::list::ListId;

/// Map size above which dead entries are swept on the next acquisition.
const SWEEP_THRESHOLD: usize = 256;

/// Held while a list mutation is in progress.
pub struct ListGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Registry of per-list async locks.
#[derive(Default)]
pub struct ListLocks {
    locks: Mutex<HashMap<ListId, Weak<AsyncMutex<()>>>>,
}

impl ListLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `list`.
    pub async fn lock(&self, list: ListId) -> ListGuard {
        let lock = self.lock_for(list);
        ListGuard {
            _guard: lock.lock_owned().await,
        }
    }

    fn lock_for(&self, list: ListId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() >= SWEEP_THRESHOLD {
            locks.retain(|_, lock| lock.strong_count() > 0);
        }
        if let Some(existing) = locks.get(&list).and_then(Weak::upgrade) {
            return existing;
        }
        let fresh = Arc::new(AsyncMutex::new(()));
        locks.insert(list, Arc::downgrade(&fresh));
        fresh
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_list_is_exclusive() {
        let locks = Arc::new(ListLocks::new());
        let list = ListId::random();
        let guard = locks.lock(list).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(list).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender acquires after release")
            .expect("task joins");
    }

    #[tokio::test]
    async fn different_lists_do_not_block() {
        let locks = ListLocks::new();
        let _first = locks.lock(ListId::random()).await;
        tokio::time::timeout(Duration::from_secs(1), locks.lock(ListId::random()))
            .await
            .expect("independent list lock acquired");
    }

    #[tokio::test]
    async fn released_locks_are_not_retained() {
        let locks = ListLocks::new();
        let guard = locks.lock(ListId::random()).await;
        assert_eq!(locks.tracked(), 1);
        drop(guard);
        assert_eq!(locks.tracked(), 0);
    }
}
