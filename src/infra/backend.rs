//! HTTP backend status sink.
//!
//! Idempotent `PUT .../{id}/confirmed` and `PUT .../{id}/failed` transitions
//! against the ledger-of-record API. Placeholder ids short-circuit before
//! any HTTP call: the backend cannot be addressed by an id it never issued.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{AppError, BackendError, BackendStatusSink, BackendTxId, SinkOutcome};

/// Configuration for the backend sink
#[derive(Debug, Clone)]
pub struct BackendSinkConfig {
    pub timeout: Duration,
}

impl Default for BackendSinkConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP implementation of the backend status sink
pub struct HttpBackendSink {
    http_client: Client,
    base_url: String,
    auth_token: Option<SecretString>,
}

impl HttpBackendSink {
    pub fn new(
        base_url: &str,
        auth_token: Option<SecretString>,
        config: BackendSinkConfig,
    ) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Backend(BackendError::Connection(e.to_string())))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    pub fn with_defaults(base_url: &str, auth_token: Option<SecretString>) -> Result<Self, AppError> {
        Self::new(base_url, auth_token, BackendSinkConfig::default())
    }

    async fn transition(&self, id: &BackendTxId, state: &str) -> Result<SinkOutcome, AppError> {
        if id.is_placeholder() {
            warn!(id = %id, state = %state, "Skipping backend call for placeholder transaction id");
            return Ok(SinkOutcome::SkippedPlaceholder);
        }

        let url = format!("{}/{}/{}", self.base_url, id, state);
        let request_id = Uuid::new_v4();
        debug!(id = %id, url = %url, request_id = %request_id, "Transitioning backend record");

        let mut request = self
            .http_client
            .put(&url)
            .header("X-Request-Id", request_id.to_string());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Backend(BackendError::Connection(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(BackendError::Status {
                code: status.as_u16(),
                body,
            }));
        }

        Ok(SinkOutcome::Updated)
    }
}

#[async_trait]
impl BackendStatusSink for HttpBackendSink {
    async fn confirm(&self, id: &BackendTxId) -> Result<SinkOutcome, AppError> {
        self.transition(id, "confirmed").await
    }

    async fn fail(&self, id: &BackendTxId) -> Result<SinkOutcome, AppError> {
        self.transition(id, "failed").await
    }
}
