// ── Runtime console configuration ──
//
// Describes *how* to reach the clinic API and where to keep the warm-start
// cache. Carries credential data but never touches config files; the
// front end builds a `ConsoleConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::model::LoginCredentials;

/// Public instance of the clinic API.
pub const DEFAULT_API_URL: &str = "https://medicore-backend-sv2c.onrender.com/api/v1/";

/// Configuration for one console instance.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// API root, e.g. `https://host/api/v1/`.
    pub api_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Directory for the durable collection cache. `None` disables it.
    pub cache_dir: Option<PathBuf>,
    /// Credentials for non-interactive login, if configured.
    pub credentials: Option<LoginCredentials>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: Duration::from_secs(30),
            cache_dir: None,
            credentials: None,
        }
    }
}
