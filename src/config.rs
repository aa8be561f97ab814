//! Configuration for talking to the conversion backend.
//!
//! Every knob lives in [`ClientConfig`], built via its [`ClientConfigBuilder`].
//! Callers set only what they care about and rely on the documented defaults
//! for the rest.

use crate::error::TrackfetchError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Base origin of the public conversion backend.
pub const DEFAULT_BACKEND_URL: &str = "https://audio-converter-backend.onrender.com";

/// Configuration for a [`crate::controller::Controller`] and its backend.
///
/// # Example
/// ```rust
/// use trackfetch::{ClientConfig, ConcurrentSubmitPolicy};
///
/// let config = ClientConfig::builder()
///     .backend_url("http://localhost:8000")
///     .request_timeout_secs(120)
///     .concurrent_submit(ConcurrentSubmitPolicy::Replace)
///     .build()
///     .unwrap();
/// assert_eq!(config.backend_url.as_str(), "http://localhost:8000/");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base origin. Download links are resolved against it.
    /// Default: [`DEFAULT_BACKEND_URL`].
    pub backend_url: Url,

    /// Timeout for `POST /convert` in seconds. Default: 600.
    ///
    /// A playlist conversion can run for several minutes on the backend
    /// before the single response arrives.
    pub request_timeout_secs: u64,

    /// Timeout for the best-effort `POST /cancel` notify in seconds. Default: 10.
    pub cancel_timeout_secs: u64,

    /// Timeout for each track/archive download in seconds. Default: 300.
    pub download_timeout_secs: u64,

    /// What `submit()` does while another submission is in flight.
    /// Default: [`ConcurrentSubmitPolicy::Reject`].
    pub concurrent_submit: ConcurrentSubmitPolicy,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: 600,
            cancel_timeout_secs: 10,
            download_timeout_secs: 300,
            concurrent_submit: ConcurrentSubmitPolicy::default(),
            user_agent: concat!("trackfetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

fn default_backend_url() -> Url {
    // The literal is a well-formed absolute URL.
    Url::parse(DEFAULT_BACKEND_URL).expect("default backend URL is valid")
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
            backend_url: None,
        }
    }

    /// Resolve a backend-relative path (e.g. `/downloads/abc.mp3`) against
    /// the base origin.
    ///
    /// Links that resolve to a different origin (`//other.host/x`,
    /// `https://other/x`) are rejected.
    pub fn resolve_link(&self, link: &str) -> Result<Url, TrackfetchError> {
        let url = self
            .backend_url
            .join(link)
            .map_err(|e| TrackfetchError::InvalidBackendUrl {
                url: link.to_string(),
                reason: e.to_string(),
            })?;
        if url.origin() != self.backend_url.origin() {
            return Err(TrackfetchError::InvalidBackendUrl {
                url: link.to_string(),
                reason: format!(
                    "link leaves the backend origin {}",
                    self.backend_url.origin().ascii_serialization()
                ),
            });
        }
        Ok(url)
    }

    /// Full URL of a backend endpoint such as `convert` or `cancel`.
    pub(crate) fn endpoint(&self, name: &str) -> Result<Url, TrackfetchError> {
        self.resolve_link(&format!("/{name}"))
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
    backend_url: Option<String>,
}

impl ClientConfigBuilder {
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn cancel_timeout_secs(mut self, secs: u64) -> Self {
        self.config.cancel_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn concurrent_submit(mut self, policy: ConcurrentSubmitPolicy) -> Self {
        self.config.concurrent_submit = policy;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ClientConfig, TrackfetchError> {
        if let Some(raw) = self.backend_url.take() {
            self.config.backend_url = parse_backend_url(&raw)?;
        }
        let c = &self.config;
        if c.request_timeout_secs == 0 || c.cancel_timeout_secs == 0 || c.download_timeout_secs == 0 {
            return Err(TrackfetchError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, TrackfetchError> {
    let url = Url::parse(raw.trim()).map_err(|e| TrackfetchError::InvalidBackendUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(TrackfetchError::InvalidBackendUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Policy for a `submit()` that arrives while another one is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrentSubmitPolicy {
    /// Refuse the new submission; the in-flight one continues. (default)
    #[default]
    Reject,
    /// Abort the in-flight request locally and start the new one.
    Replace,
}
