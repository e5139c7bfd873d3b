// ── Invalidation bus ──
//
// Same-process publish/subscribe for "this collection changed elsewhere".
// Delivery is synchronous, on the publishing task, in registration order.
// The listener list is snapshotted before delivery so listeners can
// subscribe or unsubscribe (themselves included) while being called.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, error};

use crate::model::EntityKind;

/// Signal that a collection was written out of band and a re-fetch is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub kind: EntityKind,
}

/// Which events a listener wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Kind(EntityKind),
    All,
}

impl Topic {
    fn matches(self, kind: EntityKind) -> bool {
        match self {
            Self::Kind(k) => k == kind,
            Self::All => true,
        }
    }
}

/// Outcome of one `publish` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

type Listener = dyn Fn(&Invalidation) + Send + Sync;

struct Entry {
    id: u64,
    topic: Topic,
    active: AtomicBool,
    listener: Box<Listener>,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    entries: Mutex<Vec<Arc<Entry>>>,
}

impl BusInner {
    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.lock().expect("bus lock poisoned");
        let Some(pos) = entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = entries.remove(pos);
        entry.active.store(false, Ordering::SeqCst);
        true
    }
}

/// Process-wide invalidation channel. Cheaply cloneable; clones share
/// one listener registry.
#[derive(Clone, Default)]
pub struct InvalidationBus {
    inner: Arc<BusInner>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for one collection. The registration lives as
    /// long as the returned [`Subscription`].
    pub fn subscribe<F>(&self, kind: EntityKind, listener: F) -> Subscription
    where
        F: Fn(&Invalidation) + Send + Sync + 'static,
    {
        self.register(Topic::Kind(kind), Box::new(listener))
    }

    /// Register `listener` for every collection.
    pub fn subscribe_all<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Invalidation) + Send + Sync + 'static,
    {
        self.register(Topic::All, Box::new(listener))
    }

    /// Deliver an invalidation for `kind` to every matching listener.
    ///
    /// A panicking listener is reported and skipped; delivery continues
    /// with the next one.
    pub fn publish(&self, kind: EntityKind) -> DeliveryReport {
        let event = Invalidation { kind };
        let targets: Vec<Arc<Entry>> = self
            .inner
            .entries
            .lock()
            .expect("bus lock poisoned")
            .iter()
            .filter(|e| e.topic.matches(kind))
            .cloned()
            .collect();

        debug!(%kind, event = kind.event_name(), listeners = targets.len(), "publishing invalidation");

        let mut report = DeliveryReport::default();
        for entry in targets {
            // Unsubscribed by an earlier listener in this same delivery.
            if !entry.active.load(Ordering::SeqCst) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| (entry.listener)(&event))) {
                Ok(()) => report.delivered += 1,
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_owned())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".into());
                    error!(%kind, listener = entry.id, %reason, "invalidation listener failed");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Number of live registrations across all topics.
    pub fn listener_count(&self) -> usize {
        self.inner.entries.lock().expect("bus lock poisoned").len()
    }

    fn register(&self, topic: Topic, listener: Box<Listener>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(Entry {
            id,
            topic,
            active: AtomicBool::new(true),
            listener,
        });
        self.inner
            .entries
            .lock()
            .expect("bus lock poisoned")
            .push(entry);
        debug!(?topic, listener = id, "listener registered");
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle for one registration. Dropping it unsubscribes exactly that
/// listener; dropping it twice, or after the bus is gone, is harmless.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// A detached copy of this handle that can unsubscribe the same
    /// registration from inside its own listener.
    pub fn remote(&self) -> SubscriptionRemote {
        SubscriptionRemote {
            id: self.id,
            bus: self.bus.clone(),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(self.id) {
                debug!(listener = self.id, "listener unregistered");
            }
        }
    }
}

/// Non-owning handle that can cancel a registration without holding it alive.
#[derive(Clone)]
pub struct SubscriptionRemote {
    id: u64,
    bus: Weak<BusInner>,
}

impl SubscriptionRemote {
    pub fn cancel(&self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }
}
