//! Session and data-sync core between `medicore-api` and the console front end.
//!
//! This crate owns authentication state, the per-collection caches, and the
//! plumbing that keeps independent screens consistent without a push channel:
//!
//! - **[`SessionController`]**: probes for an existing session once at
//!   start-up, then moves between [`Session::Authenticated`] and
//!   [`Session::Anonymous`] on login and logout. Logout never waits on the
//!   network to clear local state.
//!
//! - **[`EntityStore<K>`]**: one cache per collection (doctors, messages,
//!   appointments). [`ensure_fresh()`](EntityStore::ensure_fresh) fetches at
//!   most once until invalidated and merges concurrent callers into a single
//!   request; [`refresh()`](EntityStore::refresh) always fetches. Failed
//!   fetches keep the previous items. Snapshots are mirrored to a
//!   [`DurableStore`] for warm starts.
//!
//! - **[`InvalidationBus`]**: synchronous, in-process publish/subscribe keyed
//!   by [`EntityKind`]. Successful writes publish; mounted
//!   [`CollectionView`]s refresh their store in response.
//!
//! - **[`RouteGuard`]**: turns the session into render/redirect decisions,
//!   answering [`GuardDecision::Placeholder`] until the start-up probe is done.
//!
//! - **[`Console`]**: the facade that wires the above together and runs the
//!   write flows (add doctor, add admin, appointment status).

pub mod bus;
pub mod config;
pub mod console;
pub mod error;
pub mod guard;
pub mod model;
pub mod notice;
pub mod remote;
pub mod session;
pub mod store;
pub mod stream;
pub mod view;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bus::{DeliveryReport, Invalidation, InvalidationBus, Subscription, Topic};
pub use config::{ConsoleConfig, DEFAULT_API_URL};
pub use console::Console;
pub use error::{CoreError, FetchError};
pub use guard::{GuardDecision, GuardState, Route, RouteGuard, UnknownRoute};
pub use notice::{Notice, NoticeCenter, NoticeLevel};
pub use remote::RemoteApi;
pub use session::{Session, SessionController};
pub use store::{
    CacheSnapshot, CacheState, DurableStore, EntityStore, FileStore, MemoryStore, StoreContext,
};
pub use stream::EntityStream;
pub use view::{CollectionView, Dashboard, DashboardSummary};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Appointment, AppointmentDoctor, AppointmentStatus, Avatar, DEPARTMENTS, Doctor, Entity,
    EntityKind, LoginCredentials, Message, NewAdmin, NewDoctor, Principal,
};
