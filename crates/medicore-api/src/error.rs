use thiserror::Error;

/// Top-level error type for the `medicore-api` crate.
///
/// Covers every failure mode of the clinic API surface: authentication,
/// transport, HTTP status errors carrying the server's own message, and
/// payload decoding. `medicore-core` maps these into user-facing variants.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, wrong role, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The request needs a live session and the server refused it.
    #[error("Not authenticated (HTTP {status})")]
    Unauthorized {
        status: u16,
        message: Option<String>,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success status from the API, with the `message` field of the
    /// error body when the server sent one.
    #[error("API error (HTTP {status}): {}", message.as_deref().unwrap_or("no details"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Local file access failed (doctor avatar upload).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the server rejected the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The human-readable message the server attached to the failure, if any.
    ///
    /// Front ends prefer this over a generic fallback when surfacing errors.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Authentication { message } => Some(message),
            Self::Unauthorized { message, .. } | Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status code, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_body_message() {
        let err = Error::Api {
            status: 400,
            message: Some("Doctor With This Email Already Exists!".into()),
        };
        assert_eq!(
            err.server_message(),
            Some("Doctor With This Email Already Exists!")
        );
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_transient());
    }

    #[test]
    fn api_error_display_without_message() {
        let err = Error::Api {
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "API error (HTTP 502): no details");
        assert!(err.is_transient());
    }

    #[test]
    fn unauthorized_is_flagged() {
        let err = Error::Unauthorized {
            status: 401,
            message: Some("Admin Not Authenticated!".into()),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.server_message(), Some("Admin Not Authenticated!"));
    }
}
