//! Inference service client
//!
//! `POST {base}/predict` with the four measurements under the service's
//! field names. No retry; any failure ends the submission.

use crate::http::{build_client, error_body};
use async_trait::async_trait;
use bloodwise_core::{
    ConfigError, InferenceConfig, PredictionError, PredictionResult, PredictionService,
    ValidatedMeasurement,
};
use reqwest::header::ACCEPT;
use reqwest::Client;

/// HTTP prediction client
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    endpoint: String,
    timeout_ms: u64,
}

impl InferenceClient {
    /// Create client for the configured service
    ///
    /// # Errors
    /// Returns `ConfigError` if the HTTP client cannot be built.
    pub fn new(config: &InferenceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(config.timeout())?,
            endpoint: config.predict_url(),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Full prediction URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, error: &reqwest::Error) -> PredictionError {
        if error.is_timeout() {
            PredictionError::TimedOut {
                after_ms: self.timeout_ms,
            }
        } else {
            PredictionError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl PredictionService for InferenceClient {
    async fn predict(
        &self,
        input: &ValidatedMeasurement,
    ) -> Result<PredictionResult, PredictionError> {
        tracing::debug!(endpoint = %self.endpoint, "POST predict");

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(&input.to_request())
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::warn!(status = status.as_u16(), %body, "inference service error");
            return Err(PredictionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(&e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(body = %String::from_utf8_lossy(&bytes), "undecodable prediction");
            PredictionError::MalformedResponse(e.to_string())
        })
    }
}
