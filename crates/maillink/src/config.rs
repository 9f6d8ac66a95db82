//! HTTP front configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP front.
///
/// Missing fields take their [`Default`] values when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub listen: String,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Where users land after login when the link carries no `to`.
    pub base_url: String,

    /// Marks the cookie `Secure` with `SameSite=None`. Enable when served
    /// over HTTPS, possibly embedded cross-site.
    pub secure_cookie: bool,

    /// How often to drop long-expired sessions. `None` disables the
    /// sweeper; expiry is still enforced on every lookup.
    pub sweep_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            cookie_name: "MAILSESS".to_string(),
            base_url: "http://127.0.0.1:8080/".to_string(),
            secure_cookie: false,
            sweep_interval: None,
        }
    }
}
