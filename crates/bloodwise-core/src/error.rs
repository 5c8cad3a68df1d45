//! Error types for BloodWise Core
//!
//! Provides the error taxonomy of the scan flow:
//! - Client-side validation failures (before any network call)
//! - Inference service failures (transport, timeout, status, decoding)
//! - Persistence failures (non-blocking)
//! - Auth collaborator failures
//! - Configuration errors
//!
//! Every variant that reaches the user carries a `user_message()`; the
//! submission boundary turns failures into notifications instead of
//! propagating them.

use crate::types::Measurement;

/// Scan form validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A field was left empty
    #[error("missing value for {field}")]
    MissingField {
        /// The empty field
        field: Measurement,
    },

    /// A field did not parse as a finite decimal
    #[error("{field} is not a number: {raw:?}")]
    NotNumeric {
        /// The offending field
        field: Measurement,
        /// The text as entered
        raw: String,
    },

    /// A field parsed but lies outside its closed bound
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        /// The offending field
        field: Measurement,
        /// Parsed value
        value: f64,
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },
}

impl ValidationError {
    /// Field the error refers to
    #[inline]
    #[must_use]
    pub fn field(&self) -> Measurement {
        match self {
            Self::MissingField { field }
            | Self::NotNumeric { field, .. }
            | Self::OutOfRange { field, .. } => *field,
        }
    }

    /// Text shown to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField { .. } => "Please fill in all fields".to_string(),
            Self::NotNumeric { .. } => "Please enter valid numeric values".to_string(),
            Self::OutOfRange { field, min, max, .. } => {
                format!("{} must be between {} and {}", field.display_name(), min, max)
            }
        }
    }
}

/// Classes of non-success status returned by the inference service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceFailureKind {
    /// 5xx: the service failed while processing the input
    ServerProcessing,
    /// 404: the endpoint is not there
    NotFound,
    /// Any other non-2xx status
    Other,
}

impl ServiceFailureKind {
    /// Classify an HTTP status code
    #[inline]
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            500..=599 => Self::ServerProcessing,
            _ => Self::Other,
        }
    }
}

/// Inference service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    /// Service unreachable
    #[error("transport failure: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("prediction request timed out after {after_ms}ms")]
    TimedOut {
        /// Timeout that elapsed
        after_ms: u64,
    },

    /// Non-2xx response
    #[error("API Error: {status} - {body}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Response body, kept as diagnostic context
        body: String,
    },

    /// 2xx response whose body is not a prediction
    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),
}

impl PredictionError {
    /// Status classification, for `Service` errors only
    #[inline]
    #[must_use]
    pub fn service_kind(&self) -> Option<ServiceFailureKind> {
        match self {
            Self::Service { status, .. } => Some(ServiceFailureKind::from_status(*status)),
            _ => None,
        }
    }

    /// Text shown to the user
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Network error: Unable to connect to analysis server",
            Self::TimedOut { .. } => "The analysis server took too long to respond. Please try again.",
            Self::Service { status, .. } => match ServiceFailureKind::from_status(*status) {
                ServiceFailureKind::ServerProcessing => {
                    "Server processing error. Please check your input values."
                }
                ServiceFailureKind::NotFound => {
                    "Analysis service not found. Please try again later."
                }
                ServiceFailureKind::Other => {
                    "Analysis failed. Please try again or contact support."
                }
            },
            Self::MalformedResponse(_) => "Analysis failed. Please try again or contact support.",
        }
    }
}

/// Data store write errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PersistenceError {
    /// The store answered with a non-2xx status
    #[error("store rejected write: {status} - {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Store unreachable
    #[error("store transport failure: {0}")]
    Transport(String),
}

impl PersistenceError {
    /// Text shown to the user
    #[inline]
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        "Failed to save prediction to database"
    }
}

/// Auth collaborator errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// Credentials rejected locally before any call
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The auth service refused the request
    #[error("auth rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message reported by the service
        message: String,
    },

    /// Auth service unreachable
    #[error("auth transport failure: {0}")]
    Transport(String),

    /// 2xx response that could not be decoded
    #[error("malformed auth response: {0}")]
    MalformedResponse(String),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A value is present but unusable
    #[error("invalid configuration value for {key}: {reason}")]
    Invalid {
        /// Variable or key name
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// The configuration file could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A required value is absent
    #[error("missing required configuration: {0}")]
    Missing(String),
}

impl ConfigError {
    /// Create invalid value error
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that end a submission attempt
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    /// No signed-in identity
    #[error("authentication required")]
    AuthenticationRequired,

    /// Another submission is still in flight
    #[error("a submission is already in progress")]
    InProgress,

    /// Form rejected before any network call
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Inference call failed
    #[error("prediction failed: {0}")]
    Prediction(#[from] PredictionError),
}

impl SubmissionError {
    /// Check if the error was raised before any network call
    #[inline]
    #[must_use]
    pub fn is_pre_network(&self) -> bool {
        !matches!(self, Self::Prediction(_))
    }

    /// Text shown to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationRequired => {
                "Please sign in to access the blood test analysis.".to_string()
            }
            Self::InProgress => "An analysis is already running.".to_string(),
            Self::Validation(e) => e.user_message(),
            Self::Prediction(e) => e.user_message().to_string(),
        }
    }
}
