// Clinic API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, error-body extraction,
// and the `{ <collection>: [...] }` envelope used by the list endpoints.
// Endpoint groups (session, collections, writes) are inherent methods
// in separate files to keep this module focused on transport mechanics.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Error bodies look like `{"success":false,"message":"..."}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Success bodies of write endpoints carry a human-readable `message`.
#[derive(serde::Deserialize)]
pub(crate) struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Raw HTTP client for the clinic-management API.
///
/// Every request carries the session cookie from the shared jar. Methods
/// return decoded payloads; failure statuses are mapped to [`Error`] with
/// the server's `message` preserved.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    cookie_jar: Option<Arc<Jar>>,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// (session auth requires cookies). `base_url` is the API root, e.g.
    /// `https://host/api/v1/`; a missing trailing slash is added.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url),
            cookie_jar,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            cookie_jar: None,
        }
    }

    /// Whether the jar currently holds a cookie for the API host.
    pub fn has_session_cookie(&self) -> bool {
        self.cookie_jar
            .as_ref()
            .and_then(|jar| jar.cookies(&self.base_url))
            .is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve an endpoint path (no leading slash) against the API root.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        self.decode(resp).await
    }

    /// Send a request with a JSON body and decode the JSON response.
    pub(crate) async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);

        let resp = self
            .http
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        self.decode(resp).await
    }

    /// Send a multipart form and decode the JSON response.
    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, Error> {
        let url = self.endpoint(path)?;
        debug!("POST {} (multipart)", url);

        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;
        self.decode(resp).await
    }

    /// GET a list endpoint and pull the named collection out of its envelope.
    ///
    /// A missing or `null` collection decodes as empty.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
    ) -> Result<Vec<T>, Error> {
        let mut envelope: serde_json::Value = self.get_json(path).await?;
        let items = match envelope.get_mut(field).map(serde_json::Value::take) {
            None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
            Some(items) => items,
        };
        serde_json::from_value(items).map_err(|e| Error::Deserialization {
            message: format!("{field}: {e}"),
            body: envelope.to_string(),
        })
    }

    // ── Response handling ────────────────────────────────────────────

    async fn decode<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), body_len = body.len(), "response received");

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Map a failure status to an [`Error`], keeping the body's `message`.
pub(crate) fn status_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized {
            status: status.as_u16(),
            message,
        },
        _ => Error::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
