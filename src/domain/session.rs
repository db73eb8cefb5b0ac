//! Session state: the values one user is currently editing.
//!
//! A `SessionState` is owned by exactly one interactive session and passed
//! explicitly to the form controller on every render pass.

use std::collections::BTreeMap;

use super::field::{FieldKey, FieldValue, ValidationError, FIELD_REGISTRY};
use super::prediction::Submission;

/// Where the form is in its Idle / Result Shown cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormPhase {
    /// Showing current inputs only.
    #[default]
    Idle,
    /// A prediction is on screen; inputs remain editable.
    ResultShown(Submission),
    /// The last submit failed; the form stays usable.
    Failed { message: String },
}

/// Per-session key-value store of field values plus the reset flag.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    values: BTreeMap<FieldKey, FieldValue>,
    reset_pending: bool,
    phase: FormPhase,
}

impl SessionState {
    /// An empty session. Values appear once the controller initializes it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: FieldKey) -> Option<FieldValue> {
        self.values.get(&key).copied()
    }


    /// Write a field value.
    ///
    /// # Errors
    /// Returns an error, leaving the session unchanged, if the value is not
    /// in the field's domain.
    pub fn set(&mut self, key: FieldKey, value: FieldValue) -> Result<(), ValidationError> {
        if !key.spec().domain.contains(&value) {
            return Err(ValidationError::out_of_domain(key, value));
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Seed `key` with its registry default unless it already holds a value.
    ///
    /// Returns whether a value was written.
    pub fn prefill(&mut self, key: FieldKey) -> bool {
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, key.spec().default);
        true
    }

    /// Replace every field with its registry default in one step.
    pub fn restore_defaults(&mut self) {
        self.values = FIELD_REGISTRY
            .iter()
            .map(|spec| (spec.key, spec.default))
            .collect();
    }

    pub fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    #[must_use]
    pub fn reset_pending(&self) -> bool {
        self.reset_pending
    }

    /// Clear the reset flag, returning whether it was set.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_pending)
    }

    #[must_use]
    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn set_phase(&mut self, phase: FormPhase) {
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefill_does_not_overwrite() {
        let mut session = SessionState::new();
        session
            .set(FieldKey::Age, FieldValue::Integer(64))
            .expect("valid age");

        assert!(!session.prefill(FieldKey::Age));
        assert!(session.prefill(FieldKey::Bmi));
        assert_eq!(session.get(FieldKey::Age), Some(FieldValue::Integer(64)));
        assert_eq!(session.get(FieldKey::Bmi), Some(FieldValue::Decimal(22.0)));
    }

    #[test]
    fn test_set_rejects_out_of_domain() {
        let mut session = SessionState::new();
        session.restore_defaults();

        let err = session
            .set(FieldKey::Age, FieldValue::Integer(121))
            .expect_err("age above 120");
        assert!(matches!(err, ValidationError::OutOfDomain { .. }));
        assert!(session.set(FieldKey::Bmi, FieldValue::Integer(30)).is_err());
        assert!(session
            .set(FieldKey::SmokingHistory, FieldValue::Choice("sometimes"))
            .is_err());

        // Unchanged after rejection
        assert_eq!(session.get(FieldKey::Age), Some(FieldValue::Integer(30)));
        assert_eq!(session.get(FieldKey::Bmi), Some(FieldValue::Decimal(22.0)));
    }

    #[test]
    fn test_restore_defaults_is_total() {
        let mut session = SessionState::new();
        session
            .set(FieldKey::Gender, FieldValue::Choice("Male"))
            .expect("valid");
        session
            .set(FieldKey::Glucose, FieldValue::Decimal(250.0))
            .expect("valid");

        session.restore_defaults();

        for spec in &FIELD_REGISTRY {
            assert_eq!(session.get(spec.key), Some(spec.default));
        }
    }

    #[test]
    fn test_take_reset_clears_flag() {
        let mut session = SessionState::new();
        assert!(!session.take_reset());
        session.request_reset();
        assert!(session.reset_pending());
        assert!(session.take_reset());
        assert!(!session.reset_pending());
    }
}
