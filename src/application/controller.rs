//! Prediction form controller: seeds, resets and submits the form.
//!
//! The controller holds no per-user state. Each render pass takes the
//! session explicitly, applies one user action, and returns the view the
//! terminal should draw next.

use std::sync::Arc;

use crate::domain::{
    age_advisory, FieldDomain, FieldKey, FieldValue, FormPhase, PredictionRecord,
    PredictionResult, SessionState, Submission, SummaryRow, FIELD_REGISTRY,
};
use crate::ports::{Classifier, ClassifierError};

/// One user interaction with the form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    /// Write a value chosen on a control.
    Set { key: FieldKey, value: FieldValue },
    /// Cycle a choice or step a number by `delta` steps.
    Step { key: FieldKey, delta: i32 },
    /// Commit typed text into a numeric control.
    Enter { key: FieldKey, text: String },
    Reset,
    Submit,
}

/// How a control is presented.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// Enumerated choice.
    Choice {
        options: &'static [&'static str],
        selected: usize,
    },
    /// Bounded numeric entry.
    Number {
        min: f64,
        max: f64,
        step: f64,
        integer: bool,
    },
}

/// One input bound to a session field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputControl {
    pub key: FieldKey,
    pub label: &'static str,
    pub help: Option<&'static str>,
    pub value: FieldValue,
    pub kind: ControlKind,
}

/// What a render pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub inputs: Vec<InputControl>,
    pub phase: FormPhase,
}

/// Input echo shown beside a result, in registry order.
#[must_use]
pub fn summarize(session: &SessionState) -> Vec<SummaryRow> {
    FIELD_REGISTRY
        .iter()
        .map(|spec| SummaryRow {
            label: spec.short_label,
            value: session.get(spec.key).unwrap_or(spec.default).to_string(),
        })
        .collect()
}

/// Controller for the single prediction form.
///
/// The classifier is shared read-only across sessions.
pub struct FormController<C>
where
    C: Classifier + ?Sized,
{
    classifier: Arc<C>,
}

impl<C> Clone for FormController<C>
where
    C: Classifier + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<C> FormController<C>
where
    C: Classifier + ?Sized,
{
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    /// Seed every field missing from the session with its default.
    ///
    /// Safe to call on every pass; present values are never overwritten.
    /// Returns the number of fields seeded.
    pub fn initialize(&self, session: &mut SessionState) -> usize {
        let seeded = FIELD_REGISTRY
            .iter()
            .filter(|spec| session.prefill(spec.key))
            .count();
        if seeded > 0 {
            tracing::debug!("Seeded {} form fields with defaults", seeded);
        }
        seeded
    }

    /// Ask for all fields to return to their defaults.
    ///
    /// The defaults are written by the next [`render`](Self::render) pass,
    /// before any control is built.
    pub fn reset(&self, session: &mut SessionState) {
        session.request_reset();
    }

    /// Build one control per field from the current session values.
    #[must_use]
    pub fn render_inputs(&self, session: &SessionState) -> Vec<InputControl> {
        FIELD_REGISTRY
            .iter()
            .map(|spec| {
                let value = session.get(spec.key).unwrap_or(spec.default);
                let kind = match spec.domain {
                    FieldDomain::Choice(options) => ControlKind::Choice {
                        options,
                        selected: spec.domain.option_index(&value).unwrap_or(0),
                    },
                    FieldDomain::Integer { min, max, step } => ControlKind::Number {
                        min: min as f64,
                        max: max as f64,
                        step: step as f64,
                        integer: true,
                    },
                    FieldDomain::Decimal { min, max, step } => ControlKind::Number {
                        min,
                        max,
                        step,
                        integer: false,
                    },
                };
                InputControl {
                    key: spec.key,
                    label: spec.label,
                    help: spec.help,
                    value,
                    kind,
                }
            })
            .collect()
    }

    /// Score the current inputs.
    ///
    /// # Errors
    /// Returns error if the session does not form a valid record or the
    /// classifier fails. Nothing is retried.
    pub fn submit(&self, session: &SessionState) -> crate::Result<Submission> {
        let record = PredictionRecord::from_session(session)?;

        let advisory = age_advisory(record.age);
        if advisory.is_some() {
            tracing::warn!("Patient older than training range; showing advisory");
        }

        let summary = summarize(session);

        tracing::debug!(record = ?record, "Scoring record");
        let proba = self.classifier.predict_proba(&record)?;
        let label = self.classifier.predict(&record)?;
        let result =
            PredictionResult::from_classifier(proba, label).map_err(ClassifierError::from)?;

        tracing::info!(
            "Prediction complete: label={}, probability={:.4}, advisory={}",
            result.label,
            result.probability,
            advisory.is_some()
        );

        Ok(Submission {
            advisory,
            record,
            summary,
            result,
        })
    }

    /// One full pass: apply `action`, settle the session, build the view.
    pub fn render(&self, session: &mut SessionState, action: Option<FormAction>) -> FormView {
        self.initialize(session);

        if let Some(action) = action {
            self.apply(session, action);
        }

        if session.take_reset() {
            session.restore_defaults();
            session.set_phase(FormPhase::Idle);
            tracing::info!("Form reset to defaults");
        }

        FormView {
            inputs: self.render_inputs(session),
            phase: session.phase().clone(),
        }
    }

    fn apply(&self, session: &mut SessionState, action: FormAction) {
        match action {
            FormAction::Set { key, value } => Self::write_field(session, key, Some(value)),
            FormAction::Step { key, delta } => {
                let current = session.get(key).unwrap_or(key.spec().default);
                let next = key.spec().domain.shift(current, delta);
                Self::write_field(session, key, Some(next));
            }
            FormAction::Enter { key, text } => {
                let parsed = key.spec().domain.parse_clamped(&text);
                if parsed.is_none() {
                    tracing::debug!("Ignoring unparsable entry for {}", key);
                }
                Self::write_field(session, key, parsed);
            }
            FormAction::Reset => self.reset(session),
            FormAction::Submit => {
                let phase = match self.submit(session) {
                    Ok(submission) => FormPhase::ResultShown(submission),
                    Err(e) => {
                        tracing::error!("Prediction request failed: {}", e);
                        FormPhase::Failed {
                            message: e.to_string(),
                        }
                    }
                };
                session.set_phase(phase);
            }
        }
    }

    /// Write a control value; a change clears any result on screen.
    fn write_field(session: &mut SessionState, key: FieldKey, value: Option<FieldValue>) {
        let Some(value) = value else {
            return;
        };
        if session.get(key) == Some(value) {
            return;
        }
        match session.set(key, value) {
            Ok(()) => session.set_phase(FormPhase::Idle),
            Err(e) => tracing::warn!("Rejected input: {}", e),
        }
    }
}
