//! Testing utilities for BloodWise workspace
//!
//! Shared fixtures and in-memory collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use bloodwise_core::{
    AuthContext, AuthError, AuthProvider, AuthSession, Identity, Measurement, NotificationLog,
    PersistenceError, PredictionError, PredictionRecord, PredictionResult, PredictionService,
    PredictionStore, ScanSession, SignUpOutcome, UserId, ValidatedMeasurement,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const VALID_INPUT: [(Measurement, &str); 4] = [
    (Measurement::Hemoglobin, "14.2"),
    (Measurement::Mch, "28.5"),
    (Measurement::Mchc, "32.5"),
    (Measurement::Mcv, "88.5"),
];

pub fn test_identity() -> Identity {
    Identity::new(UserId::new(), "patient@example.com")
}

pub fn test_session() -> AuthSession {
    AuthSession::new(test_identity(), "test-token")
}

pub fn signed_in_context() -> Arc<AuthContext> {
    Arc::new(AuthContext::with_session(Arc::new(StaticAuth::new("pw")), test_session()))
}

pub fn signed_out_context() -> Arc<AuthContext> {
    Arc::new(AuthContext::new(Arc::new(StaticAuth::new("pw"))))
}

pub fn fill_valid(session: &ScanSession) {
    for (field, value) in VALID_INPUT {
        session.set_field(field, value);
    }
}

/// Everything a session test needs to inspect afterwards
pub struct Harness {
    pub session: Arc<ScanSession>,
    pub predictor: Arc<CountingPredictor>,
    pub store: Arc<RecordingStore>,
    pub notifications: Arc<NotificationLog>,
}

impl Harness {
    pub fn new(auth: Arc<AuthContext>, predictor: CountingPredictor, store: RecordingStore) -> Self {
        let predictor = Arc::new(predictor);
        let store = Arc::new(store);
        let notifications = Arc::new(NotificationLog::new());
        let session = Arc::new(ScanSession::new(
            auth,
            predictor.clone(),
            store.clone(),
            notifications.clone(),
        ));
        Self {
            session,
            predictor,
            store,
            notifications,
        }
    }

    pub fn signed_in(predictor: CountingPredictor, store: RecordingStore) -> Self {
        Self::new(signed_in_context(), predictor, store)
    }
}

/// Prediction service returning a fixed answer and counting calls
///
/// A gated predictor waits for `release` before answering each call.
pub struct CountingPredictor {
    answer: Result<PredictionResult, PredictionError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<ValidatedMeasurement>>,
    gate: Option<Semaphore>,
}

impl CountingPredictor {
    pub fn answering(result: PredictionResult) -> Self {
        Self::with_answer(Ok(result))
    }

    pub fn failing(error: PredictionError) -> Self {
        Self::with_answer(Err(error))
    }

    fn with_answer(answer: Result<PredictionResult, PredictionError>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Let one waiting call through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<ValidatedMeasurement> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl PredictionService for CountingPredictor {
    async fn predict(&self, input: &ValidatedMeasurement) -> Result<PredictionResult, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(*input);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.answer.clone()
    }
}

/// Store that records inserts and optionally rejects them
#[derive(Default)]
pub struct RecordingStore {
    failure: Option<PersistenceError>,
    records: Mutex<Vec<PredictionRecord>>,
}

impl RecordingStore {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting(error: PersistenceError) -> Self {
        Self {
            failure: Some(error),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<PredictionRecord> {
        self.records.lock().clone()
    }

    pub fn writes(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl PredictionStore for RecordingStore {
    async fn insert(&self, _session: &AuthSession, record: &PredictionRecord) -> Result<(), PersistenceError> {
        self.records.lock().push(record.clone());
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Auth provider accepting any email with one password
pub struct StaticAuth {
    password: String,
    sign_outs: AtomicUsize,
}

impl StaticAuth {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpOutcome, AuthError> {
        Ok(SignUpOutcome::ConfirmationRequired(Identity::new(UserId::new(), email)))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if password == self.password {
            Ok(AuthSession::new(Identity::new(UserId::new(), email), "test-token"))
        } else {
            Err(AuthError::Rejected {
                status: 400,
                message: "Invalid login credentials".into(),
            })
        }
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
