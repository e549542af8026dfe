//! Per-item mutual exclusion for check-then-insert sequences

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<i64, Arc<Mutex<()>>>;

/// One async mutex per item id, created on first use and dropped from the
/// table once nobody holds or waits for it.
#[derive(Clone, Default)]
pub struct ItemLocks {
    locks: Arc<LockTable>,
}

/// Exclusive access to one item; released on drop.
pub struct ItemLockGuard {
    item_id: i64,
    locks: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `item_id`.
    pub async fn acquire(&self, item_id: i64) -> ItemLockGuard {
        // clone the Arc out so no map shard stays locked across the await
        let lock = self.locks.entry(item_id).or_default().value().clone();
        let guard = lock.lock_owned().await;
        ItemLockGuard {
            item_id,
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Number of items with a live lock entry
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for ItemLockGuard {
    fn drop(&mut self) {
        // the guard owns a reference to the mutex, so release it first
        drop(self.guard.take());
        // waiters hold their own clone, which keeps the count above one; the
        // shard lock taken by remove_if also excludes a concurrent acquire
        self.locks
            .remove_if(&self.item_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
