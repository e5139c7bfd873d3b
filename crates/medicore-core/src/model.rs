// ── Domain model ──
//
// Entity kinds and the `Entity` trait that ties each cached collection
// type to its identifier, its invalidation topic, and its fetch call.

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::remote::RemoteApi;

pub use medicore_api::{
    Appointment, AppointmentDoctor, AppointmentStatus, Avatar, DEPARTMENTS, Doctor,
    LoginCredentials, Message, NewAdmin, NewDoctor, Principal,
};

/// The server-managed collections the console caches.
///
/// Publishers and subscribers on the invalidation bus both name
/// collections through this enum, never through free-form strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Doctors,
    Messages,
    Appointments,
}

impl EntityKind {
    /// Stable event identifier for this collection's invalidation topic.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Doctors => "doctorUpdated",
            Self::Messages => "messageUpdated",
            Self::Appointments => "appointmentUpdated",
        }
    }

    /// Key of this collection's entry in the durable store.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Doctors => "doctors",
            Self::Messages => "messages",
            Self::Appointments => "appointments",
        }
    }
}

/// A record type held by an [`EntityStore`](crate::store::EntityStore).
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Server-assigned identifier.
    fn id(&self) -> &str;

    /// Fetch the full ordered collection from the API.
    fn fetch(api: &dyn RemoteApi) -> BoxFuture<'_, Result<Vec<Self>, medicore_api::Error>>;
}

impl Entity for Doctor {
    const KIND: EntityKind = EntityKind::Doctors;

    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(api: &dyn RemoteApi) -> BoxFuture<'_, Result<Vec<Self>, medicore_api::Error>> {
        api.list_doctors()
    }
}

impl Entity for Message {
    const KIND: EntityKind = EntityKind::Messages;

    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(api: &dyn RemoteApi) -> BoxFuture<'_, Result<Vec<Self>, medicore_api::Error>> {
        api.list_messages()
    }
}

impl Entity for Appointment {
    const KIND: EntityKind = EntityKind::Appointments;

    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(api: &dyn RemoteApi) -> BoxFuture<'_, Result<Vec<Self>, medicore_api::Error>> {
        api.list_appointments()
    }
}
