//! Error types for the trackfetch library.
//!
//! Only transport-level and local failures are errors here. A backend that
//! answers `{"status": "error"}` did its job: that answer is a
//! [`crate::protocol::ConversionResult::Error`], not a [`TrackfetchError`].
//! Likewise a user-initiated cancellation is an outcome, never an error.
//!
//! The controller never propagates these past its own boundary; it folds them
//! into status text and a [`crate::controller::SubmitOutcome`]. The lower
//! layers ([`crate::backend`], [`crate::download`]) return them as-is so
//! other front-ends can decide for themselves.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the trackfetch library.
#[derive(Debug, Error)]
pub enum TrackfetchError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The backend base URL is not an absolute HTTP/HTTPS URL.
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request could not be sent or the connection dropped.
    #[error("Request to '{endpoint}' failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The backend did not answer within the configured timeout.
    #[error("Request to '{endpoint}' timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// The backend answered with a non-2xx status and a body we could not read.
    #[error("Backend returned HTTP {status} for '{endpoint}'")]
    HttpStatus { endpoint: String, status: u16 },

    /// The response body was not the expected JSON shape.
    #[error("Malformed response from '{endpoint}': {reason}")]
    Decode { endpoint: String, reason: String },

    // ── Download errors ───────────────────────────────────────────────────
    /// A track or archive could not be fetched.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Could not create or write a downloaded file.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackfetchError {
    /// Map a reqwest failure for `endpoint` onto the matching variant.
    pub(crate) fn from_reqwest(endpoint: &str, timeout_secs: u64, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TrackfetchError::Timeout {
                endpoint: endpoint.to_string(),
                secs: timeout_secs,
            }
        } else if e.is_decode() {
            TrackfetchError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        } else {
            TrackfetchError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }

    /// True for failures that happened on the wire rather than locally.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TrackfetchError::Transport { .. }
                | TrackfetchError::Timeout { .. }
                | TrackfetchError::HttpStatus { .. }
                | TrackfetchError::Decode { .. }
        )
    }
}
