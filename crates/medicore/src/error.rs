//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use medicore_config::ConfigError;
use medicore_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the clinic API at {url}")]
    #[diagnostic(
        code(medicore::connection_failed),
        help(
            "Check your network and the API URL.\n\
             URL: {url}\n\
             Override with: medicore --api-url <URL> ..."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(medicore::timeout),
        help("The hosted API can take a while to wake up. Retry, or raise --timeout.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login failed: {message}")]
    #[diagnostic(
        code(medicore::auth_failed),
        help(
            "Check the email and password for profile '{profile}'.\n\
             Only administrator accounts can sign in."
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("Not logged in")]
    #[diagnostic(
        code(medicore::not_authenticated),
        help(
            "Set an email in your profile (medicore config init) and provide the\n\
             password via MEDICORE_PASSWORD, or run interactively to be prompted."
        )
    )]
    NotAuthenticated,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(medicore::not_found),
        help("Run: medicore {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("No view at '{path}'")]
    #[diagnostic(
        code(medicore::unknown_view),
        help("Known views: /, /doctors, /messages, /doctor/addnew, /admin/addnew, /login")
    )]
    UnknownView { path: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(medicore::rejected))]
    Rejected { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(medicore::api_error))]
    ApiError { message: String },

    #[error("Could not load {what}")]
    #[diagnostic(
        code(medicore::fetch_failed),
        help("Nothing is cached for this view yet. Check connectivity and retry.")
    )]
    FetchFailed { what: String },

    #[error("'{operation}' is not available: {reason}")]
    #[diagnostic(code(medicore::unsupported))]
    Unsupported { operation: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(medicore::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(medicore::config),
        help("Inspect the resolved configuration with: medicore config show")
    )]
    Config(#[from] ConfigError),

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(medicore::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NotAuthenticated => exit_code::AUTH,
            Self::NotFound { .. } | Self::UnknownView { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout => CliError::Timeout,

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::NotAuthenticated => CliError::NotAuthenticated,

            CoreError::Fetch(e) => CliError::FetchFailed {
                what: e.kind.to_string(),
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: format!("{entity_type}s list"),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Unsupported { operation, reason } => {
                CliError::Unsupported { operation, reason }
            }

            CoreError::Rejected { message, status: _ } => CliError::Rejected { message },

            CoreError::Api { message, status: _ } => CliError::ApiError { message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
