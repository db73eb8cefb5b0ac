//! Prediction result types.
//!
//! Represents what the classifier returned for one record and how the form
//! presents it.

use super::record::PredictionRecord;

/// Patients older than this fall outside most of the training data.
pub const ADVISORY_AGE_LIMIT: u32 = 80;

/// Shown when the patient is older than [`ADVISORY_AGE_LIMIT`].
pub const AGE_ADVISORY: &str =
    "Model was trained mostly on patients aged 80 or younger. Result may be less accurate.";

/// Shown under every result.
pub const DISCLAIMER: &str =
    "This tool provides informational predictions and does not replace medical advice.";

/// Tolerance when checking that `predict_proba` rows sum to one.
const PROBA_SUM_TOLERANCE: f64 = 1e-6;

/// Advisory for an age, if one applies.
#[must_use]
pub fn age_advisory(age: u32) -> Option<&'static str> {
    (age > ADVISORY_AGE_LIMIT).then_some(AGE_ADVISORY)
}

/// Binary risk statement derived from the class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskVerdict {
    /// Label 0
    Unlikely,
    /// Label 1
    Likely,
}

impl RiskVerdict {
    #[must_use]
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Self::Likely
        } else {
            Self::Unlikely
        }
    }

    /// Sentence shown under the probability.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Likely => "The patient is likely to have diabetes.",
            Self::Unlikely => "The patient is unlikely to have diabetes.",
        }
    }
}

impl std::fmt::Display for RiskVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Likely => write!(f, "LIKELY"),
            Self::Unlikely => write!(f, "UNLIKELY"),
        }
    }
}

/// Classifier output that is not a two-class distribution and a 0/1 label.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct MalformedOutput(String);

/// Classifier output for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    /// Probability of the positive class (0.0 to 1.0)
    pub probability: f64,

    /// Predicted class (0 = no diabetes, 1 = diabetes)
    pub label: u8,
}

impl PredictionResult {
    /// Build a result from the two classifier calls.
    ///
    /// # Errors
    /// Returns `MalformedOutput` if the probabilities are not a distribution
    /// over two classes or the label is not 0 or 1.
    pub fn from_classifier(proba: [f64; 2], label: u8) -> Result<Self, MalformedOutput> {
        let [p0, p1] = proba;
        if !proba.iter().all(|p| p.is_finite() && (0.0..=1.0).contains(p)) {
            return Err(MalformedOutput(format!(
                "probabilities [{p0}, {p1}] outside [0, 1]"
            )));
        }
        if ((p0 + p1) - 1.0).abs() > PROBA_SUM_TOLERANCE {
            return Err(MalformedOutput(format!(
                "probabilities [{p0}, {p1}] do not sum to 1"
            )));
        }
        if label > 1 {
            return Err(MalformedOutput(format!(
                "class label {label} must be 0 or 1"
            )));
        }

        Ok(Self {
            probability: p1,
            label,
        })
    }

    /// Probability as a percentage with one decimal, e.g. `80.0%`.
    #[must_use]
    pub fn percentage(&self) -> String {
        format!("{:.1}%", self.probability * 100.0)
    }

    #[must_use]
    pub fn verdict(&self) -> RiskVerdict {
        RiskVerdict::from_label(self.label)
    }
}

/// One line of the input echo shown with a result.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

/// Everything shown after a successful submit.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub advisory: Option<&'static str>,
    pub record: PredictionRecord,
    pub summary: Vec<SummaryRow>,
    pub result: PredictionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_likely_result_rendering() {
        let result = PredictionResult::from_classifier([0.2, 0.8], 1).expect("valid");
        assert_eq!(result.percentage(), "80.0%");
        assert_eq!(result.verdict(), RiskVerdict::Likely);
        assert!(result.verdict().message().contains("likely to have diabetes"));
    }

    #[test]
    fn test_unlikely_result_rendering() {
        let result = PredictionResult::from_classifier([0.95, 0.05], 0).expect("valid");
        assert_eq!(result.percentage(), "5.0%");
        assert!(result.verdict().message().contains("unlikely"));
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        let result = PredictionResult::from_classifier([0.1234, 0.8766], 1).expect("valid");
        assert_eq!(result.percentage(), "87.7%");
    }

    #[test]
    fn test_rejects_malformed_classifier_output() {
        assert!(PredictionResult::from_classifier([0.5, 0.6], 1).is_err());
        assert!(PredictionResult::from_classifier([-0.1, 1.1], 1).is_err());
        assert!(PredictionResult::from_classifier([f64::NAN, 0.5], 0).is_err());
        assert!(PredictionResult::from_classifier([0.5, 0.5], 2).is_err());
    }

    #[test]
    fn test_malformed_output_names_the_problem() {
        let err = PredictionResult::from_classifier([0.7, 0.7], 1).expect_err("malformed");
        assert_eq!(err.to_string(), "probabilities [0.7, 0.7] do not sum to 1");
    }

    #[test]
    fn test_age_advisory_boundary() {
        assert_eq!(age_advisory(80), None);
        assert_eq!(age_advisory(0), None);
        assert_eq!(age_advisory(81), Some(AGE_ADVISORY));
        assert_eq!(age_advisory(120), Some(AGE_ADVISORY));
    }
}
