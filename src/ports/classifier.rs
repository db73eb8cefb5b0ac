//! Classifier port: the pre-trained binary model the form consults.
//!
//! The model is trained and exported elsewhere; this trait is the only
//! surface the application sees.

use crate::domain::{MalformedOutput, PredictionRecord};

/// Failures raised while scoring a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Unknown category {value:?} for feature {feature}")]
    UnknownCategory { feature: String, value: String },

    #[error("Missing feature {0}")]
    MissingFeature(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Malformed classifier output: {0}")]
    Malformed(#[from] MalformedOutput),
}

/// Binary classifier over a single prediction record.
///
/// Implementations are loaded once and shared read-only by every session,
/// so inference must not mutate the model.
pub trait Classifier: Send + Sync {
    /// Class probabilities `[p0, p1]` for the record.
    ///
    /// # Errors
    /// Returns `ClassifierError` if the record cannot be scored.
    fn predict_proba(&self, record: &PredictionRecord) -> Result<[f64; 2], ClassifierError>;

    /// Predicted class label, 0 or 1.
    ///
    /// # Errors
    /// Returns `ClassifierError` if the record cannot be scored.
    fn predict(&self, record: &PredictionRecord) -> Result<u8, ClassifierError>;
}
