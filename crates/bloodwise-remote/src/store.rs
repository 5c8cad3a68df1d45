//! Prediction history store client
//!
//! One `POST /rest/v1/predictions` per record, authorized as the signed-in
//! user so row-level policies see the right owner.

use crate::http::{build_client, error_body, join};
use async_trait::async_trait;
use bloodwise_core::{
    AuthSession, BackendConfig, ConfigError, PersistenceError, PredictionRecord, PredictionStore,
};
use reqwest::Client;
use std::time::Duration;

/// Table holding prediction records
pub const PREDICTIONS_TABLE: &str = "predictions";

/// HTTP table client
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    endpoint: String,
    anon_key: String,
}

impl SupabaseStore {
    /// Create client for the configured backend
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` without an anonymous key.
    pub fn new(config: &BackendConfig, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: join(&config.url, &format!("/rest/v1/{PREDICTIONS_TABLE}")),
            anon_key: config.require_anon_key()?.to_string(),
        })
    }

    /// Full table URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionStore for SupabaseStore {
    async fn insert(
        &self,
        session: &AuthSession,
        record: &PredictionRecord,
    ) -> Result<(), PersistenceError> {
        tracing::debug!(user = %record.user_id, "insert prediction record");

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&session.access_token)
            .json(&[record])
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(PersistenceError::Rejected {
            status: status.as_u16(),
            body: error_body(response).await,
        })
    }
}
