// ── Core error types ──
//
// User-facing errors from medicore-core. Consumers never see raw HTTP
// details or JSON parse failures; the `From<medicore_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use crate::model::EntityKind;

/// A failed collection fetch. Cloneable so every caller merged into one
/// in-flight fetch receives the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to fetch {kind}: {message}")]
pub struct FetchError {
    pub kind: EntityKind,
    pub status: Option<u16>,
    pub message: String,
    pub server_message: Option<String>,
}

impl FetchError {
    pub(crate) fn from_api(kind: EntityKind, err: &medicore_api::Error) -> Self {
        Self {
            kind,
            status: err.status(),
            message: err.to_string(),
            server_message: err.server_message().map(str::to_owned),
        }
    }

    pub(crate) fn aborted(kind: EntityKind, reason: &str) -> Self {
        Self {
            kind,
            status: None,
            message: format!("fetch task aborted: {reason}"),
            server_message: None,
        }
    }

    /// Text for the operator: the server's explanation when it gave one.
    pub fn notice_text(&self) -> String {
        self.server_message
            .clone()
            .unwrap_or_else(|| format!("Failed to fetch {}", self.kind))
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the clinic API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not logged in")]
    NotAuthenticated,

    // ── Data errors ──────────────────────────────────────────────────
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} ({reason})")]
    Unsupported { operation: String, reason: String },

    #[error("Rejected by the server: {message}")]
    Rejected { message: String, status: u16 },

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<medicore_api::Error> for CoreError {
    fn from(err: medicore_api::Error) -> Self {
        match err {
            medicore_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            medicore_api::Error::Unauthorized { .. } => CoreError::NotAuthenticated,
            medicore_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            medicore_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            medicore_api::Error::Api {
                status,
                message: Some(message),
            } if (400..500).contains(&status) => CoreError::Rejected { message, status },
            medicore_api::Error::Api { status, message } => CoreError::Api {
                message: message.unwrap_or_else(|| format!("HTTP {status}")),
                status: Some(status),
            },
            medicore_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            medicore_api::Error::Io(e) => CoreError::Internal(format!("I/O error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_with_message_become_rejections() {
        let err = CoreError::from(medicore_api::Error::Api {
            status: 400,
            message: Some("Doctor With This Email Already Exists!".into()),
        });
        assert!(matches!(err, CoreError::Rejected { status: 400, .. }));
        assert_eq!(
            err.to_string(),
            "Rejected by the server: Doctor With This Email Already Exists!"
        );
    }

    #[test]
    fn unauthorized_maps_to_not_authenticated() {
        let err = CoreError::from(medicore_api::Error::Unauthorized {
            status: 401,
            message: None,
        });
        assert!(matches!(err, CoreError::NotAuthenticated));
    }

    #[test]
    fn fetch_notice_falls_back_to_generic_text() {
        let err = FetchError::from_api(
            EntityKind::Doctors,
            &medicore_api::Error::Api {
                status: 500,
                message: None,
            },
        );
        assert_eq!(err.notice_text(), "Failed to fetch doctors");
        assert_eq!(err.status, Some(500));
    }
}
