// Clinic collection and write endpoints
//
// Doctors, messages, and appointments are read as whole collections.
// Writes return the server's confirmation message for display.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::debug;

use crate::client::{ApiClient, MessageBody};
use crate::error::Error;
use crate::models::{Appointment, AppointmentStatus, Doctor, Message, NewAdmin, NewDoctor};

impl ApiClient {
    // ── Collections ──────────────────────────────────────────────────

    /// List every registered doctor.
    ///
    /// `GET user/doctors` → `{ doctors: [...] }`
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, Error> {
        self.get_list("user/doctors", "doctors").await
    }

    /// List contact-form messages.
    ///
    /// `GET message/` → `{ messages: [...] }`
    pub async fn list_messages(&self) -> Result<Vec<Message>, Error> {
        self.get_list("message/", "messages").await
    }

    /// List appointment requests.
    ///
    /// `GET appointment/` → `{ appointments: [...] }`
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, Error> {
        self.get_list("appointment/", "appointments").await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Set the review status of one appointment.
    pub async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<String, Error> {
        debug!(id, %status, "updating appointment status");
        let body: MessageBody = self
            .send_json(
                Method::PUT,
                &format!("appointment/{id}"),
                &json!({ "status": status }),
            )
            .await?;
        Ok(body
            .message
            .unwrap_or_else(|| "Appointment Status Updated!".into()))
    }

    /// Register a new doctor, uploading the avatar image if one is given.
    ///
    /// Empty form fields are left out of the multipart body.
    pub async fn add_doctor(&self, doctor: &NewDoctor) -> Result<String, Error> {
        let mut form = Form::new();
        for (name, value) in [
            ("firstName", doctor.first_name.as_str()),
            ("lastName", doctor.last_name.as_str()),
            ("email", doctor.email.as_str()),
            ("phone", doctor.phone.as_str()),
            ("nic", doctor.nic.as_str()),
            ("dob", doctor.dob.as_str()),
            ("gender", doctor.gender.as_str()),
            ("password", doctor.password.expose_secret()),
            ("doctorDepartment", doctor.doctor_department.as_str()),
        ] {
            if !value.is_empty() {
                form = form.text(name, value.to_owned());
            }
        }

        if let Some(path) = &doctor.avatar {
            form = form.part("docAvatar", avatar_part(path).await?);
        }

        debug!(email = %doctor.email, "registering doctor");
        let body: MessageBody = self.send_multipart("user/doctor/addnew", form).await?;
        Ok(body
            .message
            .unwrap_or_else(|| "New Doctor Registered".into()))
    }

    /// Register a new administrator.
    pub async fn add_admin(&self, admin: &NewAdmin) -> Result<String, Error> {
        let body = json!({
            "firstName": admin.first_name,
            "lastName": admin.last_name,
            "email": admin.email,
            "phone": admin.phone,
            "nic": admin.nic,
            "dob": admin.dob,
            "gender": admin.gender,
            "password": admin.password.expose_secret(),
        });

        debug!(email = %admin.email, "registering admin");
        let resp: MessageBody = self
            .send_json(Method::POST, "user/admin/addnew", &body)
            .await?;
        Ok(resp
            .message
            .unwrap_or_else(|| "New Admin Registered".into()))
    }
}

async fn avatar_part(path: &Path) -> Result<Part, Error> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map_or_else(|| "avatar".to_owned(), |n| n.to_string_lossy().into_owned());
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(Error::Transport)
}
