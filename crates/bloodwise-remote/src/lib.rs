//! BloodWise Remote - HTTP collaborators
//!
//! `reqwest` implementations of the service traits from `bloodwise-core`:
//! - [`InferenceClient`]: prediction endpoint
//! - [`SupabaseAuth`]: password auth against the hosted backend
//! - [`SupabaseStore`]: prediction history table

#![warn(unreachable_pub)]

pub mod auth;
mod http;
pub mod inference;
pub mod store;

pub use auth::SupabaseAuth;
pub use inference::InferenceClient;
pub use store::SupabaseStore;

use bloodwise_core::{AppConfig, AuthProvider, ConfigError, PredictionService, PredictionStore};
use std::sync::Arc;

/// All three collaborators, built from one configuration
#[derive(Clone)]
pub struct RemoteServices {
    /// Inference service
    pub predictor: Arc<dyn PredictionService>,
    /// Auth service
    pub auth: Arc<dyn AuthProvider>,
    /// Record store
    pub store: Arc<dyn PredictionStore>,
}

impl RemoteServices {
    /// Build HTTP clients for every service
    ///
    /// Backend calls share the inference timeout.
    ///
    /// # Errors
    /// Returns `ConfigError` if a client cannot be built or the backend key
    /// is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let timeout = config.inference.timeout();
        let predictor = InferenceClient::new(&config.inference)?;
        let store = SupabaseStore::new(&config.backend, timeout)?;
        tracing::debug!(
            predict = predictor.endpoint(),
            store = store.endpoint(),
            "remote services configured"
        );
        Ok(Self {
            predictor: Arc::new(predictor),
            auth: Arc::new(SupabaseAuth::new(&config.backend, timeout)?),
            store: Arc::new(store),
        })
    }
}

impl std::fmt::Debug for RemoteServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteServices").finish_non_exhaustive()
    }
}
