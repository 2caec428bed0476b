//! Per-series exclusive locks.

use barvault_types::SeriesKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per series key, created on first use.
///
/// Entries nobody holds or waits on are pruned on the next acquire, so the map
/// stays as small as the number of series in flight.
#[derive(Debug, Default)]
pub(crate) struct SeriesLocks {
    locks: Mutex<HashMap<SeriesKey, Arc<Mutex<()>>>>,
}

impl SeriesLocks {
    /// Waits for exclusive access to `key`.
    pub(crate) async fn acquire(&self, key: &SeriesKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Held guards and waiters each own a clone.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
