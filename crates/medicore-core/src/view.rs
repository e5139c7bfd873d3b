// ── Mounted collection views ──
//
// A `CollectionView` is what a screen holds while it shows a collection:
// a change stream on the shared store plus one bus registration that
// refreshes the store when the collection is written elsewhere. Dropping
// the view removes exactly that registration.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use crate::bus::{InvalidationBus, Subscription};
use crate::model::{Appointment, AppointmentStatus, Doctor, Entity, Principal};
use crate::store::{CacheSnapshot, CacheState, EntityStore};
use crate::stream::EntityStream;

pub struct CollectionView<K: Entity> {
    store: EntityStore<K>,
    stream: EntityStream<K>,
    _listener: Subscription,
}

impl<K: Entity> CollectionView<K> {
    /// Register for invalidations of `K`, then make sure the store is
    /// populated. A failed fetch still mounts the view; the store has
    /// already raised a notice and keeps whatever it had.
    pub async fn mount(store: &EntityStore<K>, bus: &InvalidationBus) -> Self {
        let handle = Handle::current();
        let target = store.clone();
        let listener = bus.subscribe(K::KIND, move |_| {
            let target = target.clone();
            handle.spawn(async move {
                // Failures are reported by the store.
                let _ = target.refresh().await;
            });
        });
        let view = Self {
            store: store.clone(),
            stream: store.subscribe(),
            _listener: listener,
        };
        if let Err(e) = view.store.ensure_fresh().await {
            debug!(kind = %K::KIND, error = %e, "mounted without fresh data");
        }
        view
    }

    pub fn snapshot(&self) -> CacheSnapshot<K> {
        self.store.get()
    }

    pub fn store(&self) -> &EntityStore<K> {
        &self.store
    }

    /// Next change of the underlying store. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<CacheSnapshot<K>> {
        self.stream.changed().await
    }

    /// Latest snapshot, marked as seen.
    pub fn catch_up(&mut self) -> CacheSnapshot<K> {
        self.stream.catch_up().clone()
    }

    /// Wait until the store holds a fetch that has not been invalidated.
    pub async fn until_fresh(&mut self) -> Option<CacheSnapshot<K>> {
        loop {
            let latest = self.stream.latest();
            if matches!(latest.state, CacheState::Populated { .. }) {
                return Some(latest);
            }
            self.stream.changed().await?;
        }
    }

    pub fn unmount(self) {
        debug!(kind = %K::KIND, "view unmounted");
    }
}

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub admin: Option<String>,
    pub appointments: usize,
    pub pending: usize,
    pub doctors: usize,
}

/// The dashboard screen: appointments and doctors mounted together.
pub struct Dashboard {
    pub appointments: CollectionView<Appointment>,
    pub doctors: CollectionView<Doctor>,
    pub admin: Option<Arc<Principal>>,
}

impl Dashboard {
    pub fn summary(&self) -> DashboardSummary {
        let appointments = self.appointments.snapshot();
        DashboardSummary {
            admin: self.admin.as_ref().map(|p| p.display_name()),
            appointments: appointments.len(),
            pending: appointments
                .items()
                .iter()
                .filter(|a| a.status == AppointmentStatus::Pending)
                .count(),
            doctors: self.doctors.snapshot().len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use crate::notice::NoticeCenter;
    use crate::store::StoreContext;
    use crate::testing::{Reply, StubApi, doctor, ids};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn setup() -> (Arc<StubApi>, StoreContext) {
        let api = Arc::new(StubApi::new());
        let ctx = StoreContext {
            api: api.clone(),
            notices: NoticeCenter::new(),
            bus: InvalidationBus::new(),
            durable: None,
        };
        (api, ctx)
    }

    #[tokio::test]
    async fn publish_refreshes_every_mounted_view() {
        let (api, ctx) = setup();
        api.doctors.set(vec![doctor("d1"), doctor("d2")]);
        let store = EntityStore::<Doctor>::new(&ctx);

        let mut list = CollectionView::mount(&store, &ctx.bus).await;
        let mut picker = CollectionView::mount(&store, &ctx.bus).await;
        assert_eq!(api.doctors.calls(), 1);
        assert_eq!(ids(picker.snapshot().items()), ["d1", "d2"]);

        api.doctors.set(vec![doctor("d1"), doctor("d2"), doctor("d3")]);
        let report = ctx.bus.publish(EntityKind::Doctors);
        // The store's own listener plus one per view.
        assert_eq!(report.delivered, 3);

        let seen = list.until_fresh().await.unwrap();
        assert_eq!(ids(seen.items()), ["d1", "d2", "d3"]);
        let seen = picker.until_fresh().await.unwrap();
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn unmount_removes_only_that_listener() {
        let (_api, ctx) = setup();
        let store = EntityStore::<Doctor>::new(&ctx);
        let baseline = ctx.bus.listener_count();

        for _ in 0..3 {
            let view = CollectionView::mount(&store, &ctx.bus).await;
            assert_eq!(ctx.bus.listener_count(), baseline + 1);
            view.unmount();
        }
        let kept = CollectionView::mount(&store, &ctx.bus).await;
        assert_eq!(ctx.bus.listener_count(), baseline + 1);
        drop(kept);
        assert_eq!(ctx.bus.listener_count(), baseline);
    }

    #[tokio::test]
    async fn failed_mount_still_renders_previous_items() {
        let (api, ctx) = setup();
        api.doctors.set(vec![doctor("a"), doctor("b")]);
        let store = EntityStore::<Doctor>::new(&ctx);
        store.ensure_fresh().await.unwrap();
        store.invalidate();

        api.doctors.push(Reply::fail(502));
        let view = CollectionView::mount(&store, &ctx.bus).await;

        assert_eq!(ids(view.snapshot().items()), ["a", "b"]);
        assert!(matches!(view.snapshot().state, CacheState::Stale { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_lands_after_unmount() {
        let (api, ctx) = setup();
        let store = EntityStore::<Doctor>::new(&ctx);
        let view = CollectionView::mount(&store, &ctx.bus).await;

        api.doctors
            .push(Reply::ok(vec![doctor("late")]).after(Duration::from_millis(500)));
        ctx.bus.publish(EntityKind::Doctors);
        view.unmount();

        let mut watcher = store.subscribe();
        while !matches!(watcher.latest().state, CacheState::Populated { .. })
            || watcher.latest().is_empty()
        {
            watcher.changed().await.unwrap();
        }
        assert_eq!(ids(store.get().items()), ["late"]);
    }

    #[tokio::test]
    async fn catch_up_waits_for_the_next_change() {
        let (api, ctx) = setup();
        api.doctors.set(vec![doctor("d1")]);
        let store = EntityStore::<Doctor>::new(&ctx);
        let mut view = CollectionView::mount(&store, &ctx.bus).await;

        assert_eq!(ids(view.catch_up().items()), ["d1"]);

        store.apply_local_patch(|d| d.id == "d1", |d| d.first_name = "Renamed".into());
        let next = view.changed().await.unwrap();
        assert_eq!(next.items()[0].first_name, "Renamed");
    }
}
