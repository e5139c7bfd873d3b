// ── Console facade ──
//
// Owns one of everything: the session, the three collection stores, the
// invalidation bus and the notice center. Front ends build a single
// `Console` and drive every screen through it. Write flows live here
// because they are the producers on the bus.

use std::sync::Arc;

use medicore_api::{ApiClient, TransportConfig};
use tracing::{debug, info, warn};

use crate::bus::InvalidationBus;
use crate::config::ConsoleConfig;
use crate::error::CoreError;
use crate::guard::RouteGuard;
use crate::model::{
    Appointment, AppointmentStatus, Doctor, EntityKind, LoginCredentials, Message, NewAdmin,
    NewDoctor, Principal,
};
use crate::notice::NoticeCenter;
use crate::remote::RemoteApi;
use crate::session::{Session, SessionController};
use crate::store::{DurableStore, EntityStore, FileStore, StoreContext};
use crate::view::{CollectionView, Dashboard};

/// Shown when a login fails without a server explanation.
const LOGIN_FAILED: &str = "Login failed";

pub struct Console {
    api: Arc<dyn RemoteApi>,
    session: SessionController,
    bus: InvalidationBus,
    notices: NoticeCenter,
    doctors: EntityStore<Doctor>,
    messages: EntityStore<Message>,
    appointments: EntityStore<Appointment>,
}

impl Console {
    /// Assemble a console over `api`. With a durable store, collections
    /// start from their last saved copy.
    pub fn new(api: Arc<dyn RemoteApi>, durable: Option<Arc<dyn DurableStore>>) -> Self {
        let ctx = StoreContext {
            api: Arc::clone(&api),
            notices: NoticeCenter::new(),
            bus: InvalidationBus::new(),
            durable,
        };
        Self {
            session: SessionController::new(Arc::clone(&api)),
            doctors: EntityStore::new(&ctx),
            messages: EntityStore::new(&ctx),
            appointments: EntityStore::new(&ctx),
            bus: ctx.bus,
            notices: ctx.notices,
            api,
        }
    }

    /// Build the HTTP client and durable cache described by `config`.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default()
            .with_timeout(config.timeout)
            .with_cookie_jar();
        let client = ApiClient::new(config.api_url.clone(), &transport)?;
        let durable = config.cache_dir.as_ref().map(|dir| {
            debug!(dir = %dir.display(), "using durable collection cache");
            Arc::new(FileStore::new(dir)) as Arc<dyn DurableStore>
        });
        Ok(Self::new(Arc::new(client), durable))
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(&self.session)
    }

    pub fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    pub fn notices(&self) -> &NoticeCenter {
        &self.notices
    }

    pub fn doctors(&self) -> &EntityStore<Doctor> {
        &self.doctors
    }

    pub fn messages(&self) -> &EntityStore<Message> {
        &self.messages
    }

    pub fn appointments(&self) -> &EntityStore<Appointment> {
        &self.appointments
    }

    // ── Session ──────────────────────────────────────────────────────

    pub async fn bootstrap(&self) -> Session {
        self.session.bootstrap().await
    }

    /// Run the login exchange and, on success, authenticate the session.
    pub async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Arc<Principal>, CoreError> {
        match self.api.authenticate(credentials).await {
            Ok(principal) => {
                self.session.login(principal);
                let session = self.session.current();
                let principal = session
                    .principal()
                    .cloned()
                    .ok_or_else(|| CoreError::Internal("session lost after login".into()))?;
                self.notices
                    .success(format!("Welcome, {}", principal.display_name()));
                Ok(principal)
            }
            Err(e) => {
                self.notices
                    .error(e.server_message().unwrap_or(LOGIN_FAILED));
                Err(e.into())
            }
        }
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        self.notices.success("Logged out");
    }

    // ── Views ────────────────────────────────────────────────────────

    pub async fn view_doctors(&self) -> CollectionView<Doctor> {
        CollectionView::mount(&self.doctors, &self.bus).await
    }

    pub async fn view_messages(&self) -> CollectionView<Message> {
        CollectionView::mount(&self.messages, &self.bus).await
    }

    pub async fn view_appointments(&self) -> CollectionView<Appointment> {
        CollectionView::mount(&self.appointments, &self.bus).await
    }

    pub async fn dashboard(&self) -> Dashboard {
        let (appointments, doctors) =
            futures_util::future::join(self.view_appointments(), self.view_doctors()).await;
        Dashboard {
            appointments,
            doctors,
            admin: self.session.current().principal().cloned(),
        }
    }

    // ── Write flows ──────────────────────────────────────────────────

    /// Register a doctor. Success invalidates the doctors collection.
    pub async fn add_doctor(&self, doctor: &NewDoctor) -> Result<String, CoreError> {
        self.require_session()?;
        let message = self.write(self.api.add_doctor(doctor).await)?;
        let report = self.bus.publish(EntityKind::Doctors);
        info!(email = %doctor.email, delivered = report.delivered, "doctor added");
        Ok(message)
    }

    pub async fn add_admin(&self, admin: &NewAdmin) -> Result<String, CoreError> {
        self.require_session()?;
        let message = self.write(self.api.add_admin(admin).await)?;
        info!(email = %admin.email, "admin added");
        Ok(message)
    }

    /// Change an appointment's status and patch the cached copy in place.
    pub async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<String, CoreError> {
        self.require_session()?;
        let message = self.write(self.api.update_appointment_status(id, status).await)?;
        let patched = self
            .appointments
            .apply_local_patch(|a| a.id == id, |a| a.status = status);
        if patched > 0 {
            self.appointments.persist();
        }
        info!(id, %status, patched, "appointment status updated");
        Ok(message)
    }

    /// Message deletion is switched off on the server.
    pub fn delete_message(&self, id: &str) -> Result<(), CoreError> {
        debug!(id, "message deletion requested");
        self.notices.info("Deleting messages is disabled in demo mode");
        Err(CoreError::Unsupported {
            operation: "delete message".into(),
            reason: "disabled in demo mode".into(),
        })
    }

    fn require_session(&self) -> Result<(), CoreError> {
        if self.session.current().is_authenticated() {
            Ok(())
        } else {
            Err(CoreError::NotAuthenticated)
        }
    }

    /// Report a write's outcome as a notice. Failures never reach the bus.
    fn write(&self, result: Result<String, medicore_api::Error>) -> Result<String, CoreError> {
        match result {
            Ok(message) => {
                self.notices.success(message.clone());
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "write rejected");
                let err = CoreError::from(e);
                self.notices.error(match &err {
                    CoreError::Rejected { message, .. } => message.clone(),
                    other => other.to_string(),
                });
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("session", &self.session.current())
            .field("doctors", &self.doctors)
            .field("messages", &self.messages)
            .field("appointments", &self.appointments)
            .finish_non_exhaustive()
    }
}
