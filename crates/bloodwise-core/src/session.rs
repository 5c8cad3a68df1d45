//! Scan session
//!
//! Orchestrates one visit to the scan screen:
//! - Holds the form as the user types
//! - Validates, requests a prediction, persists it
//! - Presents the latest result
//! - Reports every outcome as a notification
//!
//! Only one submission runs at a time. `reset` does not cancel an in-flight
//! call; a call that completes after a reset is dropped.

use crate::auth::AuthContext;
use crate::error::{PersistenceError, SubmissionError};
use crate::form::ScanForm;
use crate::notify::{emit, Notification, Notifier};
use crate::presenter::ResultView;
use crate::services::{PredictionService, PredictionStore};
use crate::state_machine::{validate_transition, SubmissionPhase};
use crate::types::{Measurement, PredictionRecord, PredictionResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shown after a prediction is computed and stored
pub const SUCCESS_MESSAGE: &str = "Analysis completed successfully!";

/// What happened to the record write
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceOutcome {
    /// No prediction to store
    NotAttempted,
    /// Record written
    Saved(PredictionRecord),
    /// Write failed; the prediction is still shown
    Failed(PersistenceError),
}

impl PersistenceOutcome {
    /// Check if the record was written
    #[inline]
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Outcome of one `submit` call
///
/// The computation and the persistence results are independent: a failed
/// write never turns a computed prediction into an error.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    /// Prediction, or why there is none
    pub computation: Result<PredictionResult, SubmissionError>,
    /// Record write outcome
    pub persistence: PersistenceOutcome,
    /// A reset happened while this submission was in flight
    pub discarded: bool,
}

impl SubmissionReport {
    fn rejected(error: SubmissionError) -> Self {
        Self {
            computation: Err(error),
            persistence: PersistenceOutcome::NotAttempted,
            discarded: false,
        }
    }

    /// Check if a prediction was computed and stored
    #[inline]
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.computation.is_ok() && self.persistence.is_saved()
    }

    /// Prediction, if one was computed
    #[inline]
    #[must_use]
    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.computation.as_ref().ok()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    form: ScanForm,
    phase: SubmissionPhase,
    /// Bumped by every reset; completions from older generations are dropped
    generation: u64,
    in_flight: bool,
    result: Option<PredictionResult>,
    view: Option<ResultView>,
}

impl SessionState {
    fn advance(&mut self, to: SubmissionPhase) {
        let checked = validate_transition(self.phase, to);
        debug_assert!(checked.is_ok(), "{checked:?}");
        if let Err(e) = checked {
            tracing::error!(error = %e, "unexpected submission transition");
        }
        self.phase = to;
    }

    fn fail(&mut self) {
        self.advance(SubmissionPhase::Failed);
        self.in_flight = false;
    }
}

/// Releases the submission slot if `submit` is dropped before it finishes
///
/// Ends the submission as `Done` once a prediction has been presented and as
/// `Failed` otherwise. A reset since the submission began makes this a no-op.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<SessionState>, generation: u64) -> Self {
        Self {
            state,
            generation,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if state.generation != self.generation || !state.in_flight || !state.phase.is_busy() {
            return;
        }
        tracing::warn!(phase = ?state.phase, "submission abandoned before completion");
        if state.phase == SubmissionPhase::Persisting {
            state.advance(SubmissionPhase::Done);
            state.in_flight = false;
        } else {
            state.fail();
        }
    }
}

/// The scan screen's state and submission flow
pub struct ScanSession {
    auth: Arc<AuthContext>,
    predictor: Arc<dyn PredictionService>,
    store: Arc<dyn PredictionStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
}

impl ScanSession {
    /// Create session with an empty form
    #[must_use]
    pub fn new(
        auth: Arc<AuthContext>,
        predictor: Arc<dyn PredictionService>,
        store: Arc<dyn PredictionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            auth,
            predictor,
            store,
            notifier,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Update one field
    pub fn set_field(&self, field: Measurement, value: impl Into<String>) {
        self.state.lock().form.set(field, value);
    }

    /// Current text of one field
    #[must_use]
    pub fn field(&self, field: Measurement) -> String {
        self.state.lock().form.get(field).to_string()
    }

    /// Copy of the whole form
    #[must_use]
    pub fn form(&self) -> ScanForm {
        self.state.lock().form.clone()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        self.state.lock().phase
    }

    /// Check if a submission is in flight
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Check if the submit affordance should be enabled
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.auth.is_signed_in()
    }

    /// Latest presented result
    #[must_use]
    pub fn presented(&self) -> Option<ResultView> {
        self.state.lock().view.clone()
    }

    /// Latest raw prediction
    #[must_use]
    pub fn last_result(&self) -> Option<PredictionResult> {
        self.state.lock().result.clone()
    }

    /// Clear the form and result and return to `Idle`
    ///
    /// An in-flight call keeps running; its result will be dropped.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if state.in_flight {
            tracing::debug!(generation = state.generation, "reset with submission in flight");
        }
        state.form.clear();
        state.result = None;
        state.view = None;
        state.in_flight = false;
        state.generation = state.generation.wrapping_add(1);
        state.advance(SubmissionPhase::Idle);
    }

    /// Validate, predict, persist, present
    ///
    /// Never fails: every failure is reported through the notifier and in
    /// the returned report.
    pub async fn submit(&self) -> SubmissionReport {
        let Some(auth_session) = self.auth.current_session() else {
            return self.reject(SubmissionError::AuthenticationRequired);
        };

        let begun = {
            let mut state = self.state.lock();
            if state.in_flight {
                None
            } else {
                state.in_flight = true;
                state.result = None;
                state.view = None;
                state.advance(SubmissionPhase::Validating);
                let validated = state.form.validate();
                match validated {
                    Ok(measurement) => {
                        state.advance(SubmissionPhase::Submitting);
                        Some(Ok((state.generation, measurement)))
                    }
                    Err(e) => {
                        state.fail();
                        Some(Err(e))
                    }
                }
            }
        };

        let (generation, measurement) = match begun {
            None => return self.reject(SubmissionError::InProgress),
            Some(Err(e)) => return self.reject(SubmissionError::Validation(e)),
            Some(Ok(started)) => started,
        };
        let mut guard = InFlight::new(&self.state, generation);

        tracing::info!(user = %auth_session.identity.id, "requesting prediction");
        let computed = self.predictor.predict(&measurement).await;

        let result = {
            let mut state = self.state.lock();
            if state.generation != generation {
                guard.disarm();
                tracing::debug!("prediction arrived after reset, dropping");
                return SubmissionReport {
                    computation: computed.map_err(SubmissionError::from),
                    persistence: PersistenceOutcome::NotAttempted,
                    discarded: true,
                };
            }
            match computed {
                Ok(result) => {
                    state.advance(SubmissionPhase::Persisting);
                    state.view = Some(ResultView::from_result(&result));
                    state.result = Some(result.clone());
                    Ok(result)
                }
                Err(e) => {
                    state.fail();
                    Err(e)
                }
            }
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "prediction failed");
                return self.reject(SubmissionError::Prediction(e));
            }
        };
        tracing::info!(label = %result.prediction, "prediction received");

        let record = PredictionRecord::new(&auth_session.identity, &measurement, &result);
        let persistence = match self.store.insert(&auth_session, &record).await {
            Ok(()) => PersistenceOutcome::Saved(record),
            Err(e) => {
                tracing::warn!(error = %e, "failed to save prediction");
                PersistenceOutcome::Failed(e)
            }
        };

        {
            let mut state = self.state.lock();
            guard.disarm();
            if state.generation != generation {
                tracing::debug!("persistence finished after reset");
                return SubmissionReport {
                    computation: Ok(result),
                    persistence,
                    discarded: true,
                };
            }
            state.advance(SubmissionPhase::Done);
            state.in_flight = false;
        }

        let notification = match &persistence {
            PersistenceOutcome::Failed(e) => Notification::warning(e.user_message()),
            _ => Notification::success(SUCCESS_MESSAGE),
        };
        emit(self.notifier.as_ref(), notification);

        SubmissionReport {
            computation: Ok(result),
            persistence,
            discarded: false,
        }
    }

    fn reject(&self, error: SubmissionError) -> SubmissionReport {
        emit(self.notifier.as_ref(), Notification::error(error.user_message()));
        SubmissionReport::rejected(error)
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("auth", &self.auth)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
