// Scripted `RemoteApi` stub shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use medicore_api::{
    Appointment, AppointmentStatus, Doctor, Error, LoginCredentials, Message, NewAdmin, NewDoctor,
    Principal,
};

use crate::remote::RemoteApi;

/// One queued reply: optional latency, then a result or an API error.
pub(crate) struct Reply<T> {
    pub delay: Duration,
    pub result: Result<T, Error>,
}

impl<T> Reply<T> {
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn fail(status: u16) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(Error::Api {
                status,
                message: None,
            }),
        }
    }

    /// A 200 whose body does not decode.
    pub fn malformed(body: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(Error::Deserialization {
                message: "missing field `user`".into(),
                body: body.into(),
            }),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Serves queued replies first, then falls back to `current`.
pub(crate) struct Script<T> {
    pub current: Mutex<T>,
    queued: Mutex<VecDeque<Reply<T>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(current: T) -> Self {
        Self {
            current: Mutex::new(current),
            queued: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, reply: Reply<T>) {
        self.queued.lock().unwrap().push_back(reply);
    }

    pub fn set(&self, value: T) {
        *self.current.lock().unwrap() = value;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn serve(&self) -> Result<T, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.queued.lock().unwrap().pop_front();
        match next {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            }
            None => Ok(self.current.lock().unwrap().clone()),
        }
    }
}

pub(crate) struct StubApi {
    pub probe: Script<Option<Principal>>,
    pub login: Script<Option<Principal>>,
    pub logout: Script<()>,
    pub doctors: Script<Vec<Doctor>>,
    pub messages: Script<Vec<Message>>,
    pub appointments: Script<Vec<Appointment>>,
    pub writes: Script<String>,
}

impl StubApi {
    pub fn new() -> Self {
        Self {
            probe: Script::new(None),
            login: Script::new(Some(principal("a1"))),
            logout: Script::new(()),
            doctors: Script::new(Vec::new()),
            messages: Script::new(Vec::new()),
            appointments: Script::new(Vec::new()),
            writes: Script::new("ok".into()),
        }
    }
}

#[async_trait]
impl RemoteApi for StubApi {
    async fn probe_session(&self) -> Result<Option<Principal>, Error> {
        self.probe.serve().await
    }

    async fn authenticate(&self, _credentials: &LoginCredentials) -> Result<Principal, Error> {
        self.login
            .serve()
            .await?
            .ok_or_else(|| Error::Authentication {
                message: "Invalid Email Or Password!".into(),
            })
    }

    async fn end_session(&self) -> Result<(), Error> {
        self.logout.serve().await
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, Error> {
        self.doctors.serve().await
    }

    async fn list_messages(&self) -> Result<Vec<Message>, Error> {
        self.messages.serve().await
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>, Error> {
        self.appointments.serve().await
    }

    async fn add_doctor(&self, _doctor: &NewDoctor) -> Result<String, Error> {
        self.writes.serve().await
    }

    async fn add_admin(&self, _admin: &NewAdmin) -> Result<String, Error> {
        self.writes.serve().await
    }

    async fn update_appointment_status(
        &self,
        _id: &str,
        _status: AppointmentStatus,
    ) -> Result<String, Error> {
        self.writes.serve().await
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub(crate) fn principal(id: &str) -> Principal {
    serde_json::from_value(json!({
        "_id": id,
        "firstName": "Ada",
        "lastName": "Admin",
        "email": "admin@example.com",
        "role": "Admin"
    }))
    .unwrap()
}

pub(crate) fn doctor(id: &str) -> Doctor {
    serde_json::from_value(json!({
        "_id": id,
        "firstName": "Doc",
        "lastName": id,
        "doctorDepartment": "Cardiology"
    }))
    .unwrap()
}

pub(crate) fn appointment(id: &str, status: AppointmentStatus) -> Appointment {
    serde_json::from_value(json!({
        "_id": id,
        "firstName": "Pat",
        "lastName": id,
        "department": "ENT",
        "status": status
    }))
    .unwrap()
}

pub(crate) fn ids<T: crate::model::Entity>(items: &[T]) -> Vec<String> {
    items.iter().map(|i| i.id().to_owned()).collect()
}
