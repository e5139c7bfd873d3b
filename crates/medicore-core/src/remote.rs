// ── Remote API seam ──
//
// Everything the core needs from the network, as one object-safe trait.
// `ApiClient` is the production implementation; tests plug in stubs.

use async_trait::async_trait;

use medicore_api::{
    ApiClient, Appointment, AppointmentStatus, Doctor, Error, LoginCredentials, Message, NewAdmin,
    NewDoctor, Principal,
};

/// Logical operations the console issues against the clinic API.
#[async_trait]
pub trait RemoteApi: Send + Sync + 'static {
    /// `Ok(None)` means the server reports no active session.
    async fn probe_session(&self) -> Result<Option<Principal>, Error>;

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Principal, Error>;

    async fn end_session(&self) -> Result<(), Error>;

    async fn list_doctors(&self) -> Result<Vec<Doctor>, Error>;

    async fn list_messages(&self) -> Result<Vec<Message>, Error>;

    async fn list_appointments(&self) -> Result<Vec<Appointment>, Error>;

    async fn add_doctor(&self, doctor: &NewDoctor) -> Result<String, Error>;

    async fn add_admin(&self, admin: &NewAdmin) -> Result<String, Error>;

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<String, Error>;
}

#[async_trait]
impl RemoteApi for ApiClient {
    async fn probe_session(&self) -> Result<Option<Principal>, Error> {
        ApiClient::probe_session(self).await
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Principal, Error> {
        self.login(credentials).await
    }

    async fn end_session(&self) -> Result<(), Error> {
        self.logout().await
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, Error> {
        ApiClient::list_doctors(self).await
    }

    async fn list_messages(&self) -> Result<Vec<Message>, Error> {
        ApiClient::list_messages(self).await
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>, Error> {
        ApiClient::list_appointments(self).await
    }

    async fn add_doctor(&self, doctor: &NewDoctor) -> Result<String, Error> {
        ApiClient::add_doctor(self, doctor).await
    }

    async fn add_admin(&self, admin: &NewAdmin) -> Result<String, Error> {
        ApiClient::add_admin(self, admin).await
    }

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<String, Error> {
        ApiClient::update_appointment_status(self, id, status).await
    }
}
