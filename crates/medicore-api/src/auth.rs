// Session authentication
//
// Cookie-based admin login, logout, and the "who am I" session probe.
// The login endpoint sets a session cookie in the client's jar;
// subsequent requests use that cookie automatically.

use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::{ApiClient, MessageBody};
use crate::error::Error;
use crate::models::{LoginCredentials, Principal};

const PROBE_PATH: &str = "user/admin/me";
const LOGIN_PATH: &str = "user/login";
const LOGOUT_PATH: &str = "user/admin/logout";

/// The console only ever logs in as an administrator.
const ADMIN_ROLE: &str = "Admin";
/// Shown when the server rejects a login without saying why.
const LOGIN_FAILED: &str = "Login failed";

#[derive(Deserialize)]
struct UserBody {
    #[serde(default)]
    user: Option<Principal>,
}

impl ApiClient {
    /// Ask the server who the current session belongs to.
    ///
    /// Returns `Ok(None)` when the server says there is no session
    /// (401/403) or answers without a user. Anything else that goes
    /// wrong is an error; callers decide whether that matters.
    pub async fn probe_session(&self) -> Result<Option<Principal>, Error> {
        match self.get_json::<UserBody>(PROBE_PATH).await {
            Ok(body) => Ok(body.user),
            Err(Error::Unauthorized { status, .. }) => {
                debug!(status, "no active session");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Authenticate as an administrator with email/password.
    ///
    /// On success the session cookie is stored in the client's jar and
    /// the server's principal is returned.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Principal, Error> {
        debug!(email = %credentials.email, "logging in");

        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
            "role": ADMIN_ROLE,
        });

        let resp: UserBody = self
            .send_json(Method::POST, LOGIN_PATH, &body)
            .await
            .map_err(|e| match e {
                Error::Api { status, message } | Error::Unauthorized { status, message } => {
                    debug!(status, "login rejected");
                    Error::Authentication {
                        message: message.unwrap_or_else(|| LOGIN_FAILED.to_owned()),
                    }
                }
                other => other,
            })?;

        let principal = resp.user.ok_or_else(|| Error::Authentication {
            message: "login response carried no user".into(),
        })?;

        debug!(id = %principal.id, "login successful");
        Ok(principal)
    }

    /// End the current server-side session.
    pub async fn logout(&self) -> Result<(), Error> {
        debug!("logging out");
        let body: MessageBody = self.get_json(LOGOUT_PATH).await?;
        debug!(message = body.message.as_deref().unwrap_or(""), "logout complete");
        Ok(())
    }
}
