//! Core types for BloodWise
//!
//! Defines the fundamental types of the scan flow:
//! - The four blood-test measurements and their metadata
//! - Validated measurements and the inference request body
//! - Prediction results as returned by the inference service
//! - Persisted prediction records
//! - Signed-in identity and session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// One of the four blood-test measurements collected by the scan form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    /// Hemoglobin (g/dL)
    Hemoglobin,
    /// Mean corpuscular hemoglobin (pg)
    Mch,
    /// Mean corpuscular hemoglobin concentration (g/dL)
    Mchc,
    /// Mean corpuscular volume (fL)
    Mcv,
}

impl Measurement {
    /// All measurements, in form order
    pub const ALL: [Measurement; 4] = [Self::Hemoglobin, Self::Mch, Self::Mchc, Self::Mcv];

    /// Form key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Hemoglobin => "hemoglobin",
            Self::Mch => "mch",
            Self::Mchc => "mchc",
            Self::Mcv => "mcv",
        }
    }

    /// Short name used in user-facing messages
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Hemoglobin => "Hemoglobin",
            Self::Mch => "MCH",
            Self::Mchc => "MCHC",
            Self::Mcv => "MCV",
        }
    }

    /// Field name expected by the inference service
    #[inline]
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Hemoglobin => "Hemoglobin",
            Self::Mch => "Mean_Corpuscular_Hemoglobin",
            Self::Mchc => "Mean_Corpuscular_Hemoglobin_Concentration",
            Self::Mcv => "Mean_Corpuscular_Volume",
        }
    }

    /// Inclusive plausible bounds `(min, max)`
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Hemoglobin => (0.0, 30.0),
            Self::Mch | Self::Mchc => (0.0, 50.0),
            Self::Mcv => (0.0, 150.0),
        }
    }

    /// Unit of measure
    #[inline]
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Hemoglobin | Self::Mchc => "g/dL",
            Self::Mch => "pg",
            Self::Mcv => "fL",
        }
    }

    /// Clinical normal range, shown as an input hint
    #[inline]
    #[must_use]
    pub fn normal_range(&self) -> &'static str {
        match self {
            Self::Hemoglobin => "12-16 g/dL",
            Self::Mch => "27-32 pg",
            Self::Mchc => "32-36 g/dL",
            Self::Mcv => "80-100 fL",
        }
    }

    /// Check a parsed value against the bounds
    #[inline]
    #[must_use]
    pub fn accepts(&self, value: f64) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&value)
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Measurement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown measurement: {s}"))
    }
}

/// Range-checked measurements
///
/// Only the validator constructs this, so holding one means every value is
/// finite and within its bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedMeasurement {
    pub(crate) hemoglobin: f64,
    pub(crate) mch: f64,
    pub(crate) mchc: f64,
    pub(crate) mcv: f64,
}

impl ValidatedMeasurement {
    /// Value for a measurement
    #[inline]
    #[must_use]
    pub fn get(&self, field: Measurement) -> f64 {
        match field {
            Measurement::Hemoglobin => self.hemoglobin,
            Measurement::Mch => self.mch,
            Measurement::Mchc => self.mchc,
            Measurement::Mcv => self.mcv,
        }
    }

    /// Hemoglobin (g/dL)
    #[inline]
    #[must_use]
    pub fn hemoglobin(&self) -> f64 {
        self.hemoglobin
    }

    /// MCH (pg)
    #[inline]
    #[must_use]
    pub fn mch(&self) -> f64 {
        self.mch
    }

    /// MCHC (g/dL)
    #[inline]
    #[must_use]
    pub fn mchc(&self) -> f64 {
        self.mchc
    }

    /// MCV (fL)
    #[inline]
    #[must_use]
    pub fn mcv(&self) -> f64 {
        self.mcv
    }

    /// Body sent to the inference service
    #[inline]
    #[must_use]
    pub fn to_request(&self) -> PredictionRequest {
        PredictionRequest::from(self)
    }
}

/// Inference request body
///
/// Field order is part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Hemoglobin
    #[serde(rename = "Hemoglobin")]
    pub hemoglobin: f64,
    /// Mean corpuscular hemoglobin
    #[serde(rename = "Mean_Corpuscular_Hemoglobin")]
    pub mch: f64,
    /// Mean corpuscular hemoglobin concentration
    #[serde(rename = "Mean_Corpuscular_Hemoglobin_Concentration")]
    pub mchc: f64,
    /// Mean corpuscular volume
    #[serde(rename = "Mean_Corpuscular_Volume")]
    pub mcv: f64,
}

impl From<&ValidatedMeasurement> for PredictionRequest {
    fn from(m: &ValidatedMeasurement) -> Self {
        Self {
            hemoglobin: m.hemoglobin,
            mch: m.mch,
            mchc: m.mchc,
            mcv: m.mcv,
        }
    }
}

/// Confidence as received from the inference service
///
/// The service sends a number (a fraction in `[0, 1]`, occasionally a
/// percentage) or a pre-formatted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    /// Fractional score
    Fraction(f64),
    /// Pre-formatted text, shown verbatim
    Text(String),
}

impl Confidence {
    /// Numeric score as a fraction, if one can be recovered
    ///
    /// Text of the form `"92.0%"` becomes `0.92`. Bare numbers, numeric or
    /// text, are taken as a fraction when at most 1 and as a percentage
    /// otherwise, so `92` and `"92"` both become `0.92`.
    #[must_use]
    pub fn as_fraction(&self) -> Option<f64> {
        match self {
            Self::Fraction(f) if f.is_finite() => Some(percent_or_fraction(*f)),
            Self::Fraction(_) => None,
            Self::Text(text) => {
                let trimmed = text.trim();
                let (number, percent) = match trimmed.strip_suffix('%') {
                    Some(rest) => (rest.trim(), true),
                    None => (trimmed, false),
                };
                let value = number.parse::<f64>().ok().filter(|v| v.is_finite())?;
                if percent {
                    Some(value / 100.0)
                } else {
                    Some(percent_or_fraction(value))
                }
            }
        }
    }
}

fn percent_or_fraction(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

/// Prediction returned by the inference service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Classification label, e.g. `"Healthy"` or `"Anemic"`
    pub prediction: String,
    /// Optional confidence score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    /// Optional diagnostic text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PredictionResult {
    /// Create result with label only
    #[inline]
    #[must_use]
    pub fn new(prediction: impl Into<String>) -> Self {
        Self {
            prediction: prediction.into(),
            confidence: None,
            message: None,
        }
    }

    /// With confidence
    #[inline]
    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// With message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Stable user identifier issued by the auth collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate new random user ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Signed-in user, as read from the auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID
    pub id: UserId,
    /// Email address
    pub email: String,
}

impl Identity {
    /// Create new identity
    #[inline]
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// Identity plus the bearer token used for store writes
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Signed-in identity
    pub identity: Identity,
    /// Bearer access token
    pub access_token: String,
}

impl AuthSession {
    /// Create new session
    #[inline]
    #[must_use]
    pub fn new(identity: Identity, access_token: impl Into<String>) -> Self {
        Self {
            identity,
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("identity", &self.identity)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Row written to the `predictions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Owner
    pub user_id: UserId,
    /// Hemoglobin
    pub hemoglobin: f64,
    /// MCH
    pub mch: f64,
    /// MCHC
    pub mchc: f64,
    /// MCV
    pub mcv: f64,
    /// Label returned by the inference service
    pub prediction_result: String,
    /// Confidence as a fraction, when one was returned
    pub confidence_score: Option<f64>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    /// Build the record for a completed prediction
    #[must_use]
    pub fn new(owner: &Identity, input: &ValidatedMeasurement, result: &PredictionResult) -> Self {
        Self {
            user_id: owner.id,
            hemoglobin: input.hemoglobin,
            mch: input.mch,
            mchc: input.mchc,
            mcv: input.mcv,
            prediction_result: result.prediction.clone(),
            confidence_score: result.confidence.as_ref().and_then(Confidence::as_fraction),
            created_at: Utc::now(),
        }
    }
}
