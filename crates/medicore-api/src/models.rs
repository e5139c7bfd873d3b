// Wire models for the clinic API.
//
// Field names follow the server's JSON (camelCase, Mongo `_id`). String
// fields default to empty so a record missing an optional column still
// decodes; the collections are displayed, never re-submitted.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── Session ──────────────────────────────────────────────────────────

/// The authenticated identity returned by login and the session probe.
///
/// Only the name and role are interpreted; everything else the server
/// sends is kept in `extra` and handed back to callers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Principal {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Email/password pair for the admin login exchange.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: SecretString,
}

// ── Collections ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    #[serde(default)]
    pub public_id: String,
    #[serde(default)]
    pub url: String,
}

/// A registered doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub nic: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub doctor_department: Option<String>,
    #[serde(default)]
    pub doc_avatar: Option<Avatar>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A contact-form message left by a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub read: bool,
}

/// Review state of an appointment, as set from the dashboard.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDoctor {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// A patient appointment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(rename = "appointment_date", default)]
    pub appointment_date: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub doctor: AppointmentDoctor,
    #[serde(default)]
    pub has_visited: bool,
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn patient_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn doctor_name(&self) -> String {
        format!("{} {}", self.doctor.first_name, self.doctor.last_name)
    }
}

// ── Write payloads ───────────────────────────────────────────────────

/// Registration form for a new doctor. Sent as multipart so the avatar
/// image can ride along.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub nic: String,
    pub dob: String,
    pub gender: String,
    pub password: SecretString,
    pub doctor_department: String,
    pub avatar: Option<PathBuf>,
}

/// Registration form for a new administrator.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub nic: String,
    pub dob: String,
    pub gender: String,
    pub password: SecretString,
}

/// Departments offered by the add-doctor form.
pub const DEPARTMENTS: &[&str] = &[
    "Pediatrics",
    "Orthopedics",
    "Cardiology",
    "Neurology",
    "Oncology",
    "Radiology",
    "Physical Therapy",
    "Dermatology",
    "ENT",
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn principal_keeps_unknown_fields() {
        let p: Principal = serde_json::from_value(json!({
            "_id": "a1",
            "firstName": "Ada",
            "lastName": "Admin",
            "email": "admin@example.com",
            "role": "Admin",
            "nic": "1234567890123"
        }))
        .unwrap();

        assert_eq!(p.display_name(), "Ada Admin");
        assert_eq!(p.role.as_deref(), Some("Admin"));
        assert_eq!(p.extra.get("nic"), Some(&json!("1234567890123")));
    }

    #[test]
    fn appointment_decodes_server_shape() {
        let a: Appointment = serde_json::from_value(json!({
            "_id": "ap1",
            "firstName": "Pat",
            "lastName": "Ient",
            "appointment_date": "2025-01-04",
            "department": "Cardiology",
            "doctor": { "firstName": "Gregory", "lastName": "House" },
            "hasVisited": true,
            "status": "Accepted"
        }))
        .unwrap();

        assert_eq!(a.status, AppointmentStatus::Accepted);
        assert_eq!(a.doctor_name(), "Gregory House");
        assert_eq!(a.appointment_date, "2025-01-04");
        assert!(a.has_visited);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "rejected".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::Rejected
        );
        assert!("maybe".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn message_read_defaults_to_false() {
        let m: Message = serde_json::from_value(json!({
            "_id": "m1",
            "firstName": "A",
            "lastName": "B",
            "message": "hello"
        }))
        .unwrap();
        assert!(!m.read);
    }
}
