//! Scan input validation
//!
//! Turns the four raw form texts into a [`ValidatedMeasurement`] or the first
//! [`ValidationError`] found. Checks run in three passes over the fields in
//! form order: presence, then numeric parse, then range. A later pass never
//! runs while an earlier one has a failure.

use crate::error::ValidationError;
use crate::form::ScanForm;
use crate::types::{Measurement, ValidatedMeasurement};

/// Validate a form snapshot
///
/// # Errors
/// - `ValidationError::MissingField` if any field is empty or blank
/// - `ValidationError::NotNumeric` if any field is not a finite decimal
/// - `ValidationError::OutOfRange` if any value is outside its bound
pub fn validate(form: &ScanForm) -> Result<ValidatedMeasurement, ValidationError> {
    for field in Measurement::ALL {
        if form.get(field).trim().is_empty() {
            return Err(ValidationError::MissingField { field });
        }
    }

    let mut values = [0.0_f64; 4];
    for (slot, field) in values.iter_mut().zip(Measurement::ALL) {
        *slot = parse_decimal(field, form.get(field))?;
    }

    for (value, field) in values.iter().copied().zip(Measurement::ALL) {
        if !field.accepts(value) {
            let (min, max) = field.bounds();
            return Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
    }

    let [hemoglobin, mch, mchc, mcv] = values;
    Ok(ValidatedMeasurement {
        hemoglobin,
        mch,
        mchc,
        mcv,
    })
}

fn parse_decimal(field: Measurement, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::NotNumeric {
            field,
            raw: raw.to_string(),
        })
}
