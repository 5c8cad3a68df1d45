//! BloodWise Core - blood-test scan flow
//!
//! The scan workflow of the BloodWise client:
//! - Collects four measurements as free text
//! - Validates them before any network call
//! - Requests a prediction from the inference service
//! - Persists the prediction under the signed-in user (best effort)
//! - Presents the result and reports outcomes as notifications
//!
//! The inference service, the auth service and the data store are reached
//! through the traits in [`services`]; HTTP implementations live in
//! `bloodwise-remote`.
//!
//! # Example
//!
//! ```rust,ignore
//! use bloodwise_core::prelude::*;
//!
//! # async fn example(auth: Arc<AuthContext>, predictor: Arc<dyn PredictionService>,
//! #     store: Arc<dyn PredictionStore>) {
//! let log = Arc::new(NotificationLog::new());
//! let session = ScanSession::new(auth, predictor, store, log.clone());
//!
//! session.set_field(Measurement::Hemoglobin, "14.2");
//! session.set_field(Measurement::Mch, "28.5");
//! session.set_field(Measurement::Mchc, "32.5");
//! session.set_field(Measurement::Mcv, "88.5");
//!
//! let report = session.submit().await;
//! if let Some(view) = session.presented() {
//!     println!("{}", view.render_text());
//! }
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod auth;
pub mod config;
pub mod error;
pub mod form;
pub mod notify;
pub mod presenter;
pub mod services;
pub mod session;
pub mod state_machine;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use auth::AuthContext;
pub use config::{AppConfig, BackendConfig, InferenceConfig};
pub use error::{
    AuthError, ConfigError, PersistenceError, PredictionError, ServiceFailureKind,
    SubmissionError, ValidationError,
};
pub use form::ScanForm;
pub use notify::{Notification, NotificationLevel, NotificationLog, Notifier};
pub use presenter::{Classification, ResultView, Tone};
pub use services::{AuthProvider, PredictionService, PredictionStore, SignUpOutcome};
pub use session::{PersistenceOutcome, ScanSession, SubmissionReport};
pub use state_machine::SubmissionPhase;
pub use types::{
    AuthSession, Confidence, Identity, Measurement, PredictionRecord, PredictionRequest,
    PredictionResult, UserId, ValidatedMeasurement,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a scan session
    pub use crate::{
        AppConfig, AuthContext, Measurement, NotificationLog, Notifier, PredictionService,
        PredictionStore, ResultView, ScanSession, SubmissionReport,
    };
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
