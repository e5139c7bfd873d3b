// ── Per-kind collection cache ──
//
// One `EntityStore<K>` per collection, shared by every view that shows it.
// Reads are synchronous snapshots; fetches run as spawned tasks so a
// response still lands in the store after the view that asked is gone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::durable::{self, DurableStore};
use crate::bus::{InvalidationBus, Subscription};
use crate::error::FetchError;
use crate::model::{Entity, EntityKind};
use crate::notice::NoticeCenter;
use crate::remote::RemoteApi;
use crate::stream::EntityStream;

/// Where a cache stands relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Never fetched in this process, nothing to show.
    Unpopulated,
    /// Showing the durable warm-start copy. A fetch is still owed.
    Seeded,
    /// Fetched successfully and not invalidated since.
    Populated { fetched_at: DateTime<Utc> },
    /// Fetched once, then invalidated by a write elsewhere.
    Stale { fetched_at: DateTime<Utc> },
}

impl CacheState {
    /// At least one fetch in this process succeeded.
    pub fn is_populated(self) -> bool {
        matches!(self, Self::Populated { .. } | Self::Stale { .. })
    }

    /// `ensure_fresh` would issue a fetch from this state.
    pub fn needs_fetch(self) -> bool {
        !matches!(self, Self::Populated { .. })
    }

    pub fn fetched_at(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Populated { fetched_at } | Self::Stale { fetched_at } => Some(fetched_at),
            Self::Unpopulated | Self::Seeded => None,
        }
    }
}

/// Point-in-time view of one collection. Cloning shares the item list.
#[derive(Debug, Clone)]
pub struct CacheSnapshot<K> {
    pub items: Arc<Vec<K>>,
    pub state: CacheState,
}

impl<K> CacheSnapshot<K> {
    fn unpopulated() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            state: CacheState::Unpopulated,
        }
    }

    pub fn items(&self) -> &[K] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_populated(&self) -> bool {
        self.state.is_populated()
    }
}

/// Collaborators shared by every store of one console.
#[derive(Clone)]
pub struct StoreContext {
    pub api: Arc<dyn RemoteApi>,
    pub notices: NoticeCenter,
    pub bus: InvalidationBus,
    pub durable: Option<Arc<dyn DurableStore>>,
}

type FetchOutcome<K> = Result<CacheSnapshot<K>, FetchError>;
type InFlight<K> = Shared<BoxFuture<'static, FetchOutcome<K>>>;

struct StoreInner<K: Entity> {
    api: Arc<dyn RemoteApi>,
    notices: NoticeCenter,
    durable: Option<Arc<dyn DurableStore>>,
    snapshot: watch::Sender<CacheSnapshot<K>>,
    in_flight: Mutex<Option<(u64, InFlight<K>)>>,
    next_fetch: AtomicU64,
    // Bumped by every invalidation. A fetch that started under an older
    // generation may predate the write and lands as `Stale`.
    generation: AtomicU64,
    // Held for its Drop: the registration goes away with the store.
    _invalidation: Subscription,
}

/// Cache for the collection of `K`. Cheaply cloneable; clones share state.
pub struct EntityStore<K: Entity> {
    inner: Arc<StoreInner<K>>,
}

impl<K: Entity> Clone for EntityStore<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Entity> EntityStore<K> {
    /// Build the store, seeding display items from the durable store if it
    /// holds a compatible entry, and listen for invalidations of `K::KIND`.
    pub fn new(ctx: &StoreContext) -> Self {
        let initial = ctx
            .durable
            .as_deref()
            .and_then(|d| durable::load::<K>(d, K::KIND.storage_key()))
            .map_or_else(CacheSnapshot::unpopulated, |items| {
                debug!(kind = %K::KIND, count = items.len(), "seeded from durable cache");
                CacheSnapshot {
                    items: Arc::new(items),
                    state: CacheState::Seeded,
                }
            });
        let (snapshot, _) = watch::channel(initial);

        let inner = Arc::new_cyclic(|weak: &std::sync::Weak<StoreInner<K>>| {
            let weak = weak.clone();
            let invalidation = ctx.bus.subscribe(K::KIND, move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.invalidate();
                }
            });
            StoreInner {
                api: Arc::clone(&ctx.api),
                notices: ctx.notices.clone(),
                durable: ctx.durable.clone(),
                snapshot,
                in_flight: Mutex::new(None),
                next_fetch: AtomicU64::new(0),
                generation: AtomicU64::new(0),
                _invalidation: invalidation,
            }
        });
        Self { inner }
    }

    pub fn kind(&self) -> EntityKind {
        K::KIND
    }

    /// Current snapshot. Never blocks, may be unpopulated.
    pub fn get(&self) -> CacheSnapshot<K> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn state(&self) -> CacheState {
        self.inner.snapshot.borrow().state
    }

    /// Fetch if no fetch has succeeded since start-up or the last
    /// invalidation; otherwise return the cached snapshot.
    ///
    /// Calls made while a fetch is in flight join it instead of issuing
    /// another, and all of them receive the same outcome.
    pub async fn ensure_fresh(&self) -> FetchOutcome<K> {
        let pending = {
            let mut slot = self.inner.in_flight.lock().expect("in-flight lock poisoned");
            if let Some((_, fetch)) = slot.as_ref() {
                debug!(kind = %K::KIND, "joining in-flight fetch");
                fetch.clone()
            } else {
                let current = self.get();
                if !current.state.needs_fetch() {
                    return Ok(current);
                }
                let (id, fetch) = self.start_fetch();
                *slot = Some((id, fetch.clone()));
                fetch
            }
        };
        pending.await
    }

    /// Fetch unconditionally and replace the items.
    ///
    /// Overlapping refreshes are not sequenced: whichever response arrives
    /// last is what the store ends up holding.
    pub async fn refresh(&self) -> FetchOutcome<K> {
        let fetch = {
            let mut slot = self.inner.in_flight.lock().expect("in-flight lock poisoned");
            let (id, fetch) = self.start_fetch();
            *slot = Some((id, fetch.clone()));
            fetch
        };
        fetch.await
    }

    /// Patch matching items in place without a round trip, returning how
    /// many were changed. The cache state is left as it was, so the next
    /// refresh replaces the patch with whatever the server says.
    pub fn apply_local_patch<P, T>(&self, predicate: P, transform: T) -> usize
    where
        P: Fn(&K) -> bool,
        T: Fn(&mut K),
    {
        let mut patched = 0;
        self.inner.snapshot.send_if_modified(|snap| {
            if !snap.items.iter().any(&predicate) {
                return false;
            }
            for item in Arc::make_mut(&mut snap.items)
                .iter_mut()
                .filter(|item| predicate(item))
            {
                transform(item);
                patched += 1;
            }
            true
        });
        debug!(kind = %K::KIND, patched, "applied local patch");
        patched
    }

    /// Write the current items to the durable store, if there is one.
    pub fn persist(&self) {
        if let Some(d) = self.inner.durable.as_deref() {
            let snap = self.get();
            durable::save(d, K::KIND.storage_key(), &snap.items);
        }
    }

    /// Mark the cache as owing a fetch. Items stay visible.
    pub fn invalidate(&self) {
        self.inner.invalidate();
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> EntityStream<K> {
        EntityStream::new(self.inner.snapshot.subscribe())
    }

    fn start_fetch(&self) -> (u64, InFlight<K>) {
        let id = self.inner.next_fetch.fetch_add(1, Ordering::Relaxed);
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let outcome = inner.fetch_and_apply(generation).await;
            inner.finish(id);
            outcome
        });
        let fetch = task
            .map(|joined| {
                joined.unwrap_or_else(|e| Err(FetchError::aborted(K::KIND, &e.to_string())))
            })
            .boxed()
            .shared();
        (id, fetch)
    }
}

impl<K: Entity> StoreInner<K> {
    async fn fetch_and_apply(&self, generation: u64) -> FetchOutcome<K> {
        debug!(kind = %K::KIND, generation, "fetching collection");
        match K::fetch(self.api.as_ref()).await {
            Ok(items) => {
                let items = Arc::new(items);
                if let Some(d) = self.durable.as_deref() {
                    durable::save(d, K::KIND.storage_key(), &items);
                }
                let fetched_at = Utc::now();
                let mut state = CacheState::Populated { fetched_at };
                // Checked under the channel's write lock; `invalidate` bumps
                // the generation before it takes that lock.
                self.snapshot.send_modify(|snap| {
                    if self.generation.load(Ordering::SeqCst) != generation {
                        state = CacheState::Stale { fetched_at };
                    }
                    *snap = CacheSnapshot {
                        items: Arc::clone(&items),
                        state,
                    };
                });
                let snap = CacheSnapshot { items, state };
                info!(kind = %K::KIND, count = snap.len(), state = ?snap.state, "collection refreshed");
                Ok(snap)
            }
            Err(e) => {
                let err = FetchError::from_api(K::KIND, &e);
                warn!(kind = %K::KIND, status = ?err.status, error = %e, "fetch failed, keeping cached items");
                self.notices.error(err.notice_text());
                Err(err)
            }
        }
    }

    /// Release the single-flight slot if it still holds fetch `id`.
    fn finish(&self, id: u64) {
        let mut slot = self.in_flight.lock().expect("in-flight lock poisoned");
        if slot.as_ref().is_some_and(|(current, _)| *current == id) {
            *slot = None;
        }
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        // A fetch already under way may predate the write; don't let the
        // next `ensure_fresh` join it.
        self.in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .take();
        let marked = self.snapshot.send_if_modified(|snap| match snap.state {
            CacheState::Populated { fetched_at } => {
                snap.state = CacheState::Stale { fetched_at };
                true
            }
            CacheState::Unpopulated | CacheState::Seeded | CacheState::Stale { .. } => false,
        });
        debug!(kind = %K::KIND, marked, "cache invalidated");
    }
}

impl<K: Entity> std::fmt::Debug for EntityStore<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.inner.snapshot.borrow();
        f.debug_struct("EntityStore")
            .field("kind", &K::KIND)
            .field("state", &snap.state)
            .field("items", &snap.items.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Appointment, AppointmentStatus, Doctor};
    use crate::notice::NoticeLevel;
    use crate::store::durable::MemoryStore;
    use crate::testing::{Reply, StubApi, appointment, doctor, ids};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn context(api: &Arc<StubApi>) -> StoreContext {
        StoreContext {
            api: api.clone(),
            notices: NoticeCenter::new(),
            bus: InvalidationBus::new(),
            durable: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_ensure_fresh_issues_one_fetch() {
        let api = Arc::new(StubApi::new());
        api.doctors
            .push(Reply::ok(vec![doctor("d1"), doctor("d2")]).after(Duration::from_millis(100)));
        let store = EntityStore::<Doctor>::new(&context(&api));

        let views: Vec<_> = (0..5).map(|_| store.ensure_fresh()).collect();
        let results = futures_util::future::join_all(views).await;

        assert_eq!(api.doctors.calls(), 1);
        for result in results {
            assert_eq!(ids(result.unwrap().items()), ["d1", "d2"]);
        }
        assert!(store.state().is_populated());

        // Populated: a later mount does not fetch again.
        store.ensure_fresh().await.unwrap();
        assert_eq!(api.doctors.calls(), 1);
    }

    #[tokio::test]
    async fn empty_fetch_counts_as_populated() {
        let api = Arc::new(StubApi::new());
        let store = EntityStore::<Doctor>::new(&context(&api));
        assert_eq!(store.state(), CacheState::Unpopulated);

        let snap = store.ensure_fresh().await.unwrap();
        assert!(snap.is_empty());
        assert!(snap.is_populated());

        store.ensure_fresh().await.unwrap();
        assert_eq!(api.doctors.calls(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_items_and_raises_notice() {
        let api = Arc::new(StubApi::new());
        api.doctors.set(vec![doctor("a"), doctor("b")]);
        let ctx = context(&api);
        let mut notices = ctx.notices.subscribe();
        let store = EntityStore::<Doctor>::new(&ctx);
        store.ensure_fresh().await.unwrap();
        let before = store.state();

        api.doctors.push(Reply::fail(503));
        let err = store.refresh().await.unwrap_err();

        assert_eq!(err.status, Some(503));
        assert_eq!(ids(store.get().items()), ["a", "b"]);
        assert_eq!(store.state(), before);
        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed to fetch doctors");
    }

    #[tokio::test]
    async fn failed_first_fetch_stays_unpopulated() {
        let api = Arc::new(StubApi::new());
        api.messages.push(Reply::fail(500));
        let store = EntityStore::<crate::model::Message>::new(&context(&api));

        assert!(store.ensure_fresh().await.is_err());
        assert_eq!(store.state(), CacheState::Unpopulated);

        // The next mount tries again.
        store.ensure_fresh().await.unwrap();
        assert_eq!(api.messages.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_refreshes_keep_last_response() {
        let api = Arc::new(StubApi::new());
        api.doctors
            .push(Reply::ok(vec![doctor("old")]).after(Duration::from_millis(200)));
        api.doctors.push(
            Reply::ok(vec![doctor("old"), doctor("new")]).after(Duration::from_millis(50)),
        );
        let store = EntityStore::<Doctor>::new(&context(&api));

        let (slow, fast) = tokio::join!(store.refresh(), store.refresh());

        assert_eq!(slow.unwrap().len(), 1);
        assert_eq!(fast.unwrap().len(), 2);
        // The earlier request answered last and overwrote the newer data.
        assert_eq!(ids(store.get().items()), ["old"]);
    }

    #[tokio::test]
    async fn invalidation_marks_stale_and_next_ensure_fresh_fetches() {
        let api = Arc::new(StubApi::new());
        api.doctors.set(vec![doctor("d1")]);
        let ctx = context(&api);
        let store = EntityStore::<Doctor>::new(&ctx);
        store.ensure_fresh().await.unwrap();

        api.doctors.set(vec![doctor("d1"), doctor("d2")]);
        ctx.bus.publish(EntityKind::Doctors);
        assert!(matches!(store.state(), CacheState::Stale { .. }));
        assert_eq!(store.get().len(), 1);

        // Other kinds are untouched.
        ctx.bus.publish(EntityKind::Messages);

        let snap = store.ensure_fresh().await.unwrap();
        assert_eq!(ids(snap.items()), ["d1", "d2"]);
        assert_eq!(api.doctors.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_during_first_fetch_still_owes_a_fetch() {
        let api = Arc::new(StubApi::new());
        api.doctors
            .push(Reply::ok(vec![doctor("d1")]).after(Duration::from_millis(100)));
        let ctx = context(&api);
        let store = EntityStore::<Doctor>::new(&ctx);

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.ensure_fresh().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        api.doctors.set(vec![doctor("d1"), doctor("d2")]);
        ctx.bus.publish(EntityKind::Doctors);

        // The older response is shown but does not count as fresh.
        let landed = first.await.unwrap().unwrap();
        assert_eq!(ids(landed.items()), ["d1"]);
        assert!(matches!(store.state(), CacheState::Stale { .. }));

        let snap = store.ensure_fresh().await.unwrap();
        assert_eq!(ids(snap.items()), ["d1", "d2"]);
        assert_eq!(api.doctors.calls(), 2);
        assert!(matches!(store.state(), CacheState::Populated { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_started_before_invalidation_lands_stale() {
        let api = Arc::new(StubApi::new());
        api.doctors.set(vec![doctor("d1")]);
        let ctx = context(&api);
        let store = EntityStore::<Doctor>::new(&ctx);
        store.ensure_fresh().await.unwrap();

        api.doctors
            .push(Reply::ok(vec![doctor("d1")]).after(Duration::from_millis(100)));
        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.bus.publish(EntityKind::Doctors);
        slow.await.unwrap().unwrap();

        assert!(matches!(store.state(), CacheState::Stale { .. }));
        store.ensure_fresh().await.unwrap();
        assert_eq!(api.doctors.calls(), 3);
    }

    #[tokio::test]
    async fn durable_seed_is_display_only() {
        let api = Arc::new(StubApi::new());
        api.doctors.set(vec![doctor("fresh")]);
        let durable = Arc::new(MemoryStore::new());
        durable::save(durable.as_ref(), "doctors", &[doctor("seed")]);
        let ctx = StoreContext {
            durable: Some(durable.clone()),
            ..context(&api)
        };

        let store = EntityStore::<Doctor>::new(&ctx);
        assert_eq!(store.state(), CacheState::Seeded);
        assert_eq!(ids(store.get().items()), ["seed"]);

        store.ensure_fresh().await.unwrap();
        assert_eq!(api.doctors.calls(), 1);
        assert_eq!(ids(store.get().items()), ["fresh"]);

        let stored: Vec<Doctor> = durable::load(durable.as_ref(), "doctors").unwrap();
        assert_eq!(ids(&stored), ["fresh"]);
    }

    #[tokio::test]
    async fn incompatible_seed_is_ignored() {
        let api = Arc::new(StubApi::new());
        let durable = Arc::new(MemoryStore::new());
        durable.write("appointments", "\"not a list\"").unwrap();
        let ctx = StoreContext {
            durable: Some(durable),
            ..context(&api)
        };

        let store = EntityStore::<Appointment>::new(&ctx);
        assert_eq!(store.state(), CacheState::Unpopulated);
        assert!(store.get().is_empty());
    }

    #[tokio::test]
    async fn local_patch_touches_only_matching_items_until_refresh() {
        let api = Arc::new(StubApi::new());
        api.appointments.set(vec![
            appointment("p1", AppointmentStatus::Pending),
            appointment("p2", AppointmentStatus::Pending),
        ]);
        let store = EntityStore::<Appointment>::new(&context(&api));
        store.ensure_fresh().await.unwrap();
        let state = store.state();

        let patched = store.apply_local_patch(
            |a| a.id == "p2",
            |a| a.status = AppointmentStatus::Accepted,
        );

        assert_eq!(patched, 1);
        assert_eq!(store.state(), state);
        let snap = store.get();
        assert_eq!(snap.items()[0].status, AppointmentStatus::Pending);
        assert_eq!(snap.items()[1].status, AppointmentStatus::Accepted);

        assert_eq!(store.apply_local_patch(|a| a.id == "zz", |_| {}), 0);

        // The server has not seen the change; a refresh wins.
        store.refresh().await.unwrap();
        assert_eq!(store.get().items()[1].status, AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn subscribers_see_refreshes() {
        let api = Arc::new(StubApi::new());
        api.doctors.set(vec![doctor("d1")]);
        let store = EntityStore::<Doctor>::new(&context(&api));
        let mut stream = store.subscribe();
        assert!(!stream.current().is_populated());

        store.ensure_fresh().await.unwrap();
        let snap = stream.changed().await.unwrap();
        assert_eq!(ids(snap.items()), ["d1"]);
    }

    #[tokio::test]
    async fn dropping_store_releases_bus_registration() {
        let api = Arc::new(StubApi::new());
        let ctx = context(&api);
        let store = EntityStore::<Doctor>::new(&ctx);
        assert_eq!(ctx.bus.listener_count(), 1);
        drop(store);
        assert_eq!(ctx.bus.listener_count(), 0);
    }
}
