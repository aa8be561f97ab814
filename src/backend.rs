//! The conversion backend seam.
//!
//! [`ConversionBackend`] is what the controller talks to. [`HttpBackend`] is
//! the real implementation over reqwest; tests substitute scripted ones.

use crate::config::ClientConfig;
use crate::error::TrackfetchError;
use crate::protocol::{CancelRequest, ConversionResult, ConvertRequest, ConvertResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Remote service that performs the conversion.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// `POST /convert`. Resolves once the backend has finished (or given up).
    async fn convert(&self, request: &ConvertRequest) -> Result<ConversionResult, TrackfetchError>;

    /// `POST /cancel`. The response body is not interpreted.
    async fn cancel(&self, request: &CancelRequest) -> Result<(), TrackfetchError>;
}

/// [`ConversionBackend`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, TrackfetchError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| TrackfetchError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl ConversionBackend for HttpBackend {
    async fn convert(&self, request: &ConvertRequest) -> Result<ConversionResult, TrackfetchError> {
        let url = self.config.endpoint("convert")?;
        let secs = self.config.request_timeout_secs;
        debug!("POST {} session={}", url, request.session_id);

        let response = self
            .client
            .post(url)
            .timeout(Duration::from_secs(secs))
            .json(request)
            .send()
            .await
            .map_err(|e| TrackfetchError::from_reqwest("/convert", secs, e))?;

        // The backend reports its own failures in the JSON body, sometimes
        // with a 4xx/5xx status. Only fall back to the HTTP status when the
        // body is unreadable.
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TrackfetchError::from_reqwest("/convert", secs, e))?;

        match serde_json::from_slice::<ConvertResponse>(&bytes) {
            Ok(body) => body.into_result(),
            Err(_) if !status.is_success() => Err(TrackfetchError::HttpStatus {
                endpoint: "/convert".into(),
                status: status.as_u16(),
            }),
            Err(e) => Err(TrackfetchError::Decode {
                endpoint: "/convert".into(),
                reason: e.to_string(),
            }),
        }
    }

    async fn cancel(&self, request: &CancelRequest) -> Result<(), TrackfetchError> {
        let url = self.config.endpoint("cancel")?;
        let secs = self.config.cancel_timeout_secs;
        debug!("POST {} session={}", url, request.session_id);

        self.client
            .post(url)
            .timeout(Duration::from_secs(secs))
            .json(request)
            .send()
            .await
            .map_err(|e| TrackfetchError::from_reqwest("/cancel", secs, e))?;
        Ok(())
    }
}
