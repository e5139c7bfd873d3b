// medicore-api: Async Rust client for the MediCore clinic-management API

pub mod auth;
pub mod client;
pub mod clinic;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use models::{
    Appointment, AppointmentDoctor, AppointmentStatus, Avatar, DEPARTMENTS, Doctor,
    LoginCredentials, Message, NewAdmin, NewDoctor, Principal,
};
pub use transport::TransportConfig;
