//! Domain layer: form fields, session state, records and results.
//!
//! Pure Rust types with no I/O. Every value entering the session is checked
//! against the field registry.

pub mod field;
mod prediction;
mod record;
mod session;

pub use field::{
    FieldDomain, FieldKey, FieldSpec, FieldValue, ValidationError, FIELD_REGISTRY,
};
pub use prediction::{
    age_advisory, MalformedOutput, PredictionResult, RiskVerdict, Submission, SummaryRow,
    ADVISORY_AGE_LIMIT, AGE_ADVISORY, DISCLAIMER,
};
pub use record::{yes_no_flag, Gender, PredictionRecord, SmokingHistory, FEATURE_NAMES};
pub use session::{FormPhase, SessionState};
