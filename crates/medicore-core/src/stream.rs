// ── Reactive cache streams ──
//
// Subscription types for consuming collection changes from an EntityStore.

use tokio::sync::watch;

use crate::model::Entity;
use crate::store::CacheSnapshot;

/// A subscription to one cached collection.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed).
pub struct EntityStream<K: Entity> {
    current: CacheSnapshot<K>,
    receiver: watch::Receiver<CacheSnapshot<K>>,
}

impl<K: Entity> EntityStream<K> {
    pub(crate) fn new(mut receiver: watch::Receiver<CacheSnapshot<K>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot seen at creation or at the last `changed()`.
    pub fn current(&self) -> &CacheSnapshot<K> {
        &self.current
    }

    /// The latest snapshot (may have changed since `current`).
    pub fn latest(&self) -> CacheSnapshot<K> {
        self.receiver.borrow().clone()
    }

    /// Adopt the latest snapshot so `changed()` waits for the one after it.
    pub fn catch_up(&mut self) -> &CacheSnapshot<K> {
        self.current = self.receiver.borrow_and_update().clone();
        &self.current
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<CacheSnapshot<K>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}
