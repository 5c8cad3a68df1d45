//! Application configuration
//!
//! Resolved once at startup: defaults, then an optional TOML file, then
//! environment variables.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Inference base URL variable
pub const ENV_API_URL: &str = "BLOODWISE_API_URL";
/// Inference timeout variable (milliseconds)
pub const ENV_API_TIMEOUT_MS: &str = "BLOODWISE_API_TIMEOUT_MS";
/// Backend project URL variable
pub const ENV_SUPABASE_URL: &str = "BLOODWISE_SUPABASE_URL";
/// Backend anonymous key variable
pub const ENV_SUPABASE_ANON_KEY: &str = "BLOODWISE_SUPABASE_ANON_KEY";

/// Default inference service
pub const DEFAULT_API_URL: &str = "https://anemia-web.onrender.com";
/// Default backend project
pub const DEFAULT_SUPABASE_URL: &str = "https://tdxasfchtaolvjybnjca.supabase.co";
/// Default inference timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Inference service
    pub inference: InferenceConfig,
    /// Auth and data store backend
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the process environment
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new().overlay(|key| std::env::var(key).ok())
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply variables from `lookup` on top of `self`
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if a variable is set to an unusable value.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = present(ENV_API_URL) {
            self.inference.base_url = url.trim().to_string();
        }
        if let Some(raw) = present(ENV_API_TIMEOUT_MS) {
            self.inference.timeout_ms = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_API_TIMEOUT_MS, format!("not a number: {raw}")))?;
        }
        if let Some(url) = present(ENV_SUPABASE_URL) {
            self.backend.url = url.trim().to_string();
        }
        if let Some(key) = present(ENV_SUPABASE_ANON_KEY) {
            self.backend.anon_key = Some(key.trim().to_string());
        }

        self.check()?;
        Ok(self)
    }

    /// With inference base URL
    #[inline]
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.inference.base_url = url.into();
        self
    }

    /// With backend URL and key
    #[inline]
    #[must_use]
    pub fn with_backend(mut self, url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        self.backend.url = url.into();
        self.backend.anon_key = Some(anon_key.into());
        self
    }

    fn check(&self) -> Result<(), ConfigError> {
        check_url("inference.base_url", &self.inference.base_url)?;
        check_url("backend.url", &self.backend.url)?;
        if self.inference.timeout_ms == 0 {
            return Err(ConfigError::invalid("inference.timeout_ms", "must be positive"));
        }
        Ok(())
    }
}

fn check_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("not an http(s) URL: {url}")))
    }
}

/// Inference service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL; `/predict` is appended
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl InferenceConfig {
    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full prediction endpoint
    #[must_use]
    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url.trim_end_matches('/'))
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Auth and data store backend settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL
    pub url: String,
    /// Anonymous API key
    pub anon_key: Option<String>,
}

impl BackendConfig {
    /// The anonymous key
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` if no key was configured.
    pub fn require_anon_key(&self) -> Result<&str, ConfigError> {
        self.anon_key
            .as_deref()
            .ok_or_else(|| ConfigError::Missing(ENV_SUPABASE_ANON_KEY.to_string()))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SUPABASE_URL.to_string(),
            anon_key: None,
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::new();
        assert_eq!(config.inference.base_url, DEFAULT_API_URL);
        assert_eq!(config.inference.timeout(), Duration::from_secs(30));
        assert_eq!(config.backend.url, DEFAULT_SUPABASE_URL);
        assert!(config.backend.require_anon_key().is_err());
    }

    #[test]
    fn env_overrides_defaults() {
        let config = AppConfig::new()
            .overlay(env(&[
                (ENV_API_URL, "http://localhost:8000/"),
                (ENV_API_TIMEOUT_MS, "1500"),
                (ENV_SUPABASE_ANON_KEY, "anon"),
            ]))
            .unwrap();

        assert_eq!(config.inference.predict_url(), "http://localhost:8000/predict");
        assert_eq!(config.inference.timeout_ms, 1500);
        assert_eq!(config.backend.require_anon_key().unwrap(), "anon");
        assert_eq!(config.backend.url, DEFAULT_SUPABASE_URL);
    }

    #[test]
    fn blank_variables_fall_back() {
        let config = AppConfig::new().overlay(env(&[(ENV_API_URL, "  ")])).unwrap();
        assert_eq!(config.inference.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = AppConfig::new()
            .overlay(env(&[(ENV_API_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = AppConfig::new()
            .overlay(env(&[(ENV_API_TIMEOUT_MS, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn bad_url_is_rejected() {
        let err = AppConfig::new()
            .overlay(env(&[(ENV_API_URL, "anemia-web.onrender.com")]))
            .unwrap_err();
        assert!(err.to_string().contains("inference.base_url"));
    }

    #[test]
    fn toml_partial_document() {
        let config = AppConfig::from_toml_str(
            r#"
            [inference]
            base_url = "http://127.0.0.1:9000"

            [backend]
            anon_key = "k"
            "#,
        )
        .unwrap();

        assert_eq!(config.inference.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.inference.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.backend.anon_key.as_deref(), Some("k"));
    }

    #[test]
    fn toml_syntax_error() {
        assert!(matches!(
            AppConfig::from_toml_str("[inference"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let config = AppConfig::new().with_backend("https://x.supabase.co", "topsecret");
        assert!(!format!("{config:?}").contains("topsecret"));
    }
}
