//! Shared HTTP plumbing

use bloodwise_core::ConfigError;
use reqwest::{Client, Response};
use std::time::Duration;

const USER_AGENT: &str = concat!("bloodwise/", env!("CARGO_PKG_VERSION"));

/// Build a client with a whole-request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ConfigError::invalid("http client", e.to_string()))
}

/// Join a base URL and an absolute path
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Read a failed response's body for diagnostics
pub(crate) async fn error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}
