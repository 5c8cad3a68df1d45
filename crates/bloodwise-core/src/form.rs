//! Scan form state
//!
//! Holds the four measurement fields as entered, one keystroke at a time.

use crate::error::ValidationError;
use crate::types::{Measurement, ValidatedMeasurement};
use serde::{Deserialize, Serialize};

/// Free-text scan form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanForm {
    hemoglobin: String,
    mch: String,
    mchc: String,
    mcv: String,
}

impl ScanForm {
    /// Create empty form
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text of one field
    pub fn set(&mut self, field: Measurement, value: impl Into<String>) {
        *self.slot_mut(field) = value.into();
    }

    /// Current text of one field
    #[inline]
    #[must_use]
    pub fn get(&self, field: Measurement) -> &str {
        match field {
            Measurement::Hemoglobin => &self.hemoglobin,
            Measurement::Mch => &self.mch,
            Measurement::Mchc => &self.mchc,
            Measurement::Mcv => &self.mcv,
        }
    }

    /// Check if every field is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Measurement::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    /// Empty all fields
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Validate the current contents
    ///
    /// # Errors
    /// See [`crate::validation::validate`].
    #[inline]
    pub fn validate(&self) -> Result<ValidatedMeasurement, ValidationError> {
        crate::validation::validate(self)
    }

    fn slot_mut(&mut self, field: Measurement) -> &mut String {
        match field {
            Measurement::Hemoglobin => &mut self.hemoglobin,
            Measurement::Mch => &mut self.mch,
            Measurement::Mchc => &mut self.mchc,
            Measurement::Mcv => &mut self.mcv,
        }
    }
}
