//! Auth service client
//!
//! Speaks the hosted backend's password-auth REST API:
//! - `POST /auth/v1/signup`
//! - `POST /auth/v1/token?grant_type=password`
//! - `POST /auth/v1/logout`

use crate::http::{build_client, error_body, join};
use async_trait::async_trait;
use bloodwise_core::{
    AuthError, AuthProvider, AuthSession, BackendConfig, ConfigError, Identity, SignUpOutcome,
    UserId,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    user: UserBody,
}

/// Sign-up answers with a session when confirmation is off, a bare user otherwise
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(SessionBody),
    User(UserBody),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self, raw: String) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or(raw)
    }
}

/// HTTP auth client
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    /// Create client for the configured backend
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` without an anonymous key.
    pub fn new(config: &BackendConfig, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.url.clone(),
            anon_key: config.require_anon_key()?.to_string(),
        })
    }

    async fn post_credentials(&self, path: &str, email: &str, password: &str) -> Result<Response, AuthError> {
        let response = self
            .client
            .post(join(&self.base_url, path))
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        check(response).await
    }
}

async fn check(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let raw = error_body(response).await;
    let message = serde_json::from_str::<ErrorBody>(&raw)
        .unwrap_or_default()
        .into_message(raw);
    tracing::warn!(status = status.as_u16(), %message, "auth request rejected");
    Err(AuthError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AuthError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedResponse(e.to_string()))
}

fn identity(user: UserBody, fallback_email: &str) -> Identity {
    Identity::new(user.id, user.email.unwrap_or_else(|| fallback_email.to_string()))
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let response = self.post_credentials("/auth/v1/signup", email, password).await?;
        Ok(match decode::<SignUpBody>(response).await? {
            SignUpBody::Session(body) => SignUpOutcome::SignedIn(AuthSession::new(
                identity(body.user, email),
                body.access_token,
            )),
            SignUpBody::User(user) => SignUpOutcome::ConfirmationRequired(identity(user, email)),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .post_credentials("/auth/v1/token?grant_type=password", email, password)
            .await?;
        let body: SessionBody = decode(response).await?;
        Ok(AuthSession::new(identity(body.user, email), body.access_token))
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        let response = self
            .client
            .post(join(&self.base_url, "/auth/v1/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        check(response).await.map(|_| ())
    }
}
