//! Result presentation
//!
//! Maps a [`PredictionResult`] to what the scan screen shows: a tone, a
//! heading, the label, an optional confidence line and explanatory text.
//!
//! Labels go through an explicit mapping table. Anything the table does not
//! know is shown as an unrecognized result instead of being treated as a
//! negative finding.

use crate::types::{Confidence, PredictionResult};
use serde::{Deserialize, Serialize};

/// Interpreted classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// No anemia indicators
    Healthy,
    /// Anemia indicators detected
    Anemic,
    /// Label not in the mapping table
    Unrecognized,
}

/// Service labels and their classification, compared case-insensitively
const LABELS: &[(&str, Classification)] = &[
    ("healthy", Classification::Healthy),
    ("normal", Classification::Healthy),
    ("not anemic", Classification::Healthy),
    ("non-anemic", Classification::Healthy),
    ("anemic", Classification::Anemic),
    ("anemia", Classification::Anemic),
    ("anaemic", Classification::Anemic),
    ("anaemia", Classification::Anemic),
];

impl Classification {
    /// Look up a service label
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        LABELS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(label))
            .map_or(Self::Unrecognized, |(_, class)| *class)
    }

    /// Visual treatment
    #[inline]
    #[must_use]
    pub fn tone(&self) -> Tone {
        match self {
            Self::Healthy => Tone::Positive,
            Self::Anemic => Tone::Attention,
            Self::Unrecognized => Tone::Unrecognized,
        }
    }
}

/// Mutually exclusive visual treatments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    /// Green badge
    Positive,
    /// Red badge
    Attention,
    /// Neutral badge, result needs manual review
    Unrecognized,
}

/// Shown under every result
pub const DISCLAIMER: &str =
    "Important: This is a preliminary assessment for educational purposes only.";

/// Render a confidence value
///
/// Text is shown as received; fractions become a percentage with one decimal.
#[must_use]
pub fn format_confidence(confidence: &Confidence) -> String {
    match confidence {
        Confidence::Text(text) => text.clone(),
        Confidence::Fraction(f) => confidence
            .as_fraction()
            .map_or_else(|| f.to_string(), |v| format!("{:.1}%", v * 100.0)),
    }
}

/// What the result panel displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    /// Interpreted classification
    pub classification: Classification,
    /// Label as received
    pub label: String,
    /// Formatted confidence, if any
    pub confidence: Option<String>,
    /// Service diagnostic text, if any
    pub message: Option<String>,
}

impl ResultView {
    /// Build the view for a prediction
    #[must_use]
    pub fn from_result(result: &PredictionResult) -> Self {
        Self {
            classification: Classification::from_label(&result.prediction),
            label: result.prediction.clone(),
            confidence: result
                .confidence
                .as_ref()
                .map(format_confidence)
                .filter(|text| !text.trim().is_empty()),
            message: result.message.clone().filter(|m| !m.trim().is_empty()),
        }
    }

    /// Visual treatment
    #[inline]
    #[must_use]
    pub fn tone(&self) -> Tone {
        self.classification.tone()
    }

    /// Panel heading
    #[must_use]
    pub fn heading(&self) -> &'static str {
        match self.classification {
            Classification::Healthy => "Analysis Complete",
            Classification::Anemic => "Attention Required",
            Classification::Unrecognized => "Unrecognized Result",
        }
    }

    /// Explanatory paragraph
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self.classification {
            Classification::Healthy => {
                "Based on your blood test values, no anemia indicators were detected."
            }
            Classification::Anemic => {
                "Based on your blood test values, potential anemia indicators were detected. \
                 Please consult with a healthcare professional."
            }
            Classification::Unrecognized => {
                "The analysis service returned a result this application does not recognize. \
                 Please consult with a healthcare professional before drawing conclusions."
            }
        }
    }

    /// Plain-text rendering of the whole panel
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = format!("{}\n[{}]\n", self.heading(), self.label);
        if let Some(confidence) = &self.confidence {
            out.push_str(&format!("Confidence: {confidence}\n"));
        }
        if let Some(message) = &self.message {
            out.push_str(message);
            out.push('\n');
        }
        out.push_str(self.summary());
        out.push('\n');
        out.push_str(DISCLAIMER);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_with_fraction() {
        let result: PredictionResult =
            serde_json::from_str(r#"{"prediction":"Healthy","confidence":0.92}"#).unwrap();
        let view = ResultView::from_result(&result);

        assert_eq!(view.tone(), Tone::Positive);
        assert_eq!(view.confidence.as_deref(), Some("92.0%"));
        assert!(view.render_text().contains("Confidence: 92.0%"));
    }

    #[test]
    fn anemic_without_confidence() {
        let result: PredictionResult = serde_json::from_str(r#"{"prediction":"Anemic"}"#).unwrap();
        let view = ResultView::from_result(&result);

        assert_eq!(view.tone(), Tone::Attention);
        assert_eq!(view.confidence, None);
        assert!(!view.render_text().contains("Confidence"));
    }

    #[test]
    fn text_confidence_is_shown_verbatim() {
        let result = PredictionResult::new("Healthy").with_confidence(Confidence::Text("high (87%)".into()));
        let view = ResultView::from_result(&result);
        assert_eq!(view.confidence.as_deref(), Some("high (87%)"));
    }

    #[test]
    fn zero_fraction_is_still_shown() {
        let result = PredictionResult::new("Anemic").with_confidence(Confidence::Fraction(0.0));
        assert_eq!(ResultView::from_result(&result).confidence.as_deref(), Some("0.0%"));
    }

    #[test]
    fn percentage_score_is_not_scaled_twice() {
        let result = PredictionResult::new("Healthy").with_confidence(Confidence::Fraction(92.0));
        assert_eq!(ResultView::from_result(&result).confidence.as_deref(), Some("92.0%"));
    }

    #[test]
    fn unknown_labels_are_not_aliased_to_anemic() {
        for label in ["Borderline", "", "Healthy?"] {
            let view = ResultView::from_result(&PredictionResult::new(label));
            assert_eq!(view.classification, Classification::Unrecognized, "{label:?}");
            assert_eq!(view.tone(), Tone::Unrecognized);
            assert_eq!(view.heading(), "Unrecognized Result");
        }
    }

    #[test]
    fn label_lookup_ignores_case_and_padding() {
        assert_eq!(Classification::from_label(" healthy "), Classification::Healthy);
        assert_eq!(Classification::from_label("ANEMIA"), Classification::Anemic);
        assert_eq!(Classification::from_label("Not Anemic"), Classification::Healthy);
    }

    #[test]
    fn rendering_carries_disclaimer_and_message() {
        let result = PredictionResult::new("Anemic").with_message("low MCV");
        let text = ResultView::from_result(&result).render_text();
        assert!(text.starts_with("Attention Required"));
        assert!(text.contains("low MCV"));
        assert!(text.ends_with(DISCLAIMER));
    }
}
