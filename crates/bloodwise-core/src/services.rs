//! External collaborator seams
//!
//! The scan flow talks to three remote services. Each sits behind a trait so
//! the flow can run against HTTP clients in production and fakes in tests.

use crate::error::{AuthError, PersistenceError, PredictionError};
use crate::types::{AuthSession, Identity, PredictionRecord, PredictionResult, ValidatedMeasurement};
use async_trait::async_trait;

/// Inference service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Classify one set of measurements
    ///
    /// # Errors
    /// Any `PredictionError`; none are retried.
    async fn predict(&self, input: &ValidatedMeasurement) -> Result<PredictionResult, PredictionError>;
}

/// Data store holding prediction history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Insert one record on behalf of the session's user
    ///
    /// # Errors
    /// Any `PersistenceError`.
    async fn insert(&self, session: &AuthSession, record: &PredictionRecord) -> Result<(), PersistenceError>;
}

/// Result of creating an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Account created and signed in
    SignedIn(AuthSession),
    /// Account created; email confirmation pending
    ConfirmationRequired(Identity),
}

/// Auth service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account
    ///
    /// # Errors
    /// Any `AuthError`.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    /// Exchange credentials for a session
    ///
    /// # Errors
    /// Any `AuthError`.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Revoke a session
    ///
    /// # Errors
    /// Any `AuthError`.
    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError>;
}
