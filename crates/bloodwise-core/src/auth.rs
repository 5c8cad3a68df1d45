//! Auth context
//!
//! Holds the signed-in session for the lifetime of the application. Created
//! signed out at startup, filled by `sign_in`, emptied by `sign_out`.
//! Passed explicitly to whoever needs the current identity.

use crate::error::AuthError;
use crate::services::{AuthProvider, SignUpOutcome};
use crate::types::{AuthSession, Identity};
use parking_lot::RwLock;
use std::sync::Arc;

/// Current auth state plus the provider that changes it
pub struct AuthContext {
    provider: Arc<dyn AuthProvider>,
    session: RwLock<Option<AuthSession>>,
}

impl AuthContext {
    /// Create signed-out context
    #[inline]
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            session: RwLock::new(None),
        }
    }

    /// Create context with a restored session
    #[inline]
    #[must_use]
    pub fn with_session(provider: Arc<dyn AuthProvider>, session: AuthSession) -> Self {
        Self {
            provider,
            session: RwLock::new(Some(session)),
        }
    }

    /// Signed-in identity, if any
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.session.read().as_ref().map(|s| s.identity.clone())
    }

    /// Signed-in session, if any
    #[must_use]
    pub fn current_session(&self) -> Option<AuthSession> {
        self.session.read().clone()
    }

    /// Check if someone is signed in
    #[inline]
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.read().is_some()
    }

    /// Create an account; signs in when the provider returns a session
    ///
    /// # Errors
    /// - `AuthError::InvalidInput` for an unusable email or empty password
    /// - Provider errors
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        check_credentials(email, password)?;
        let outcome = self.provider.sign_up(email.trim(), password).await?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                tracing::info!(user = %session.identity.id, "account created and signed in");
                *self.session.write() = Some(session.clone());
            }
            SignUpOutcome::ConfirmationRequired(identity) => {
                tracing::info!(user = %identity.id, "account created, confirmation pending");
            }
        }
        Ok(outcome)
    }

    /// Sign in and keep the session
    ///
    /// # Errors
    /// - `AuthError::InvalidInput` for an unusable email or empty password
    /// - Provider errors
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        check_credentials(email, password)?;
        let session = self.provider.sign_in(email.trim(), password).await?;
        tracing::info!(user = %session.identity.id, "signed in");
        let identity = session.identity.clone();
        *self.session.write() = Some(session);
        Ok(identity)
    }

    /// Sign out
    ///
    /// The local session is dropped even when the provider call fails.
    ///
    /// # Errors
    /// Provider errors, after the local session is cleared.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let taken = self.session.write().take();
        let Some(session) = taken else {
            return Ok(());
        };
        tracing::info!(user = %session.identity.id, "signing out");
        self.provider.sign_out(&session).await
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("session", &*self.session.read())
            .finish_non_exhaustive()
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidInput("a valid email address is required".into()));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".into()));
    }
    Ok(())
}
