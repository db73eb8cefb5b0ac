//! Field registry for the clinical inputs collected by the form.
//!
//! Each field has a label, an optional help text, a default value and a
//! domain. The registry order is the order in which the form shows them.

use std::fmt;

/// Options for the `gender` field.
pub const GENDER_OPTIONS: &[&str] = &["Female", "Male"];

/// Options for the `smoking_history` field.
pub const SMOKING_HISTORY_OPTIONS: &[&str] =
    &["never", "former", "current", "not current", "ever", "No Info"];

/// Options for yes/no questions (hypertension, heart disease).
pub const YES_NO_OPTIONS: &[&str] = &["No", "Yes"];

/// Identifies one of the eight form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Gender,
    SmokingHistory,
    Hypertension,
    HeartDisease,
    Age,
    Bmi,
    Hba1c,
    Glucose,
}

impl FieldKey {
    /// All keys, in registry order.
    pub const ALL: [FieldKey; 8] = [
        FieldKey::Gender,
        FieldKey::SmokingHistory,
        FieldKey::Hypertension,
        FieldKey::HeartDisease,
        FieldKey::Age,
        FieldKey::Bmi,
        FieldKey::Hba1c,
        FieldKey::Glucose,
    ];

    /// Session key name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::SmokingHistory => "smoking_history",
            Self::Hypertension => "hypertension",
            Self::HeartDisease => "heart_disease",
            Self::Age => "age",
            Self::Bmi => "bmi",
            Self::Hba1c => "hba1c",
            Self::Glucose => "glucose",
        }
    }

    /// Registry entry for this key.
    #[must_use]
    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_REGISTRY[self as usize]
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value held by a form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// One of the enumerated options of a categorical field.
    Choice(&'static str),
    /// Whole number (age).
    Integer(i64),
    /// Continuous measurement.
    Decimal(f64),
}

impl FieldValue {
    #[must_use]
    pub fn as_choice(&self) -> Option<&'static str> {
        match self {
            Self::Choice(s) => Some(*s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Decimal(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            // Shortest form, keeping one fractional digit: 22.0, 5.5, 123.46
            Self::Decimal(x) if x.fract() == 0.0 => write!(f, "{x:.1}"),
            Self::Decimal(x) => write!(f, "{x}"),
        }
    }
}

/// The set of values a field may hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDomain {
    Choice(&'static [&'static str]),
    Integer { min: i64, max: i64, step: i64 },
    Decimal { min: f64, max: f64, step: f64 },
}

/// Decimal inputs keep two fractional digits.
fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl FieldDomain {
    /// Whether `value` belongs to this domain.
    #[must_use]
    pub fn contains(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (Self::Choice(options), FieldValue::Choice(s)) => options.contains(s),
            (Self::Integer { min, max, .. }, FieldValue::Integer(n)) => (*min..=*max).contains(n),
            (Self::Decimal { min, max, .. }, FieldValue::Decimal(x)) => {
                x.is_finite() && (*min..=*max).contains(x)
            }
            _ => false,
        }
    }

    /// Position of a choice within the option list.
    #[must_use]
    pub fn option_index(&self, value: &FieldValue) -> Option<usize> {
        match (self, value) {
            (Self::Choice(options), FieldValue::Choice(s)) => options.iter().position(|o| o == s),
            _ => None,
        }
    }

    /// Move `value` by `delta` steps.
    ///
    /// Choices wrap around the option list; numbers saturate at the bounds.
    #[must_use]
    pub fn shift(&self, value: FieldValue, delta: i32) -> FieldValue {
        match (self, value) {
            (Self::Choice(options), current) => {
                let len = options.len() as i64;
                let idx = self.option_index(&current).unwrap_or(0) as i64;
                let next = (idx + i64::from(delta)).rem_euclid(len);
                FieldValue::Choice(options[next as usize])
            }
            (Self::Integer { min, max, step }, FieldValue::Integer(n)) => {
                FieldValue::Integer((n + step * i64::from(delta)).clamp(*min, *max))
            }
            (Self::Decimal { min, max, step }, FieldValue::Decimal(x)) => {
                FieldValue::Decimal(round_cents((x + step * f64::from(delta)).clamp(*min, *max)))
            }
            (_, other) => other,
        }
    }

    /// Parse typed text and clamp it into the domain.
    ///
    /// Categorical domains accept only an exact option. Returns `None` for
    /// text that is not a value of the right kind.
    #[must_use]
    pub fn parse_clamped(&self, text: &str) -> Option<FieldValue> {
        let text = text.trim();
        match self {
            Self::Choice(options) => options
                .iter()
                .copied()
                .find(|o| *o == text)
                .map(FieldValue::Choice),
            Self::Integer { min, max, .. } => text
                .parse::<i64>()
                .ok()
                .map(|n| FieldValue::Integer(n.clamp(*min, *max))),
            Self::Decimal { min, max, .. } => text
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(|x| FieldValue::Decimal(round_cents(x.clamp(*min, *max)))),
        }
    }

    /// Human-readable bounds, e.g. `10.0–60.0`.
    #[must_use]
    pub fn bounds_hint(&self) -> String {
        match self {
            Self::Choice(options) => options.join(" / "),
            Self::Integer { min, max, .. } => format!("{min}–{max}"),
            Self::Decimal { min, max, .. } => format!("{min:.1}–{max:.1}"),
        }
    }
}

/// Rejected field values and incomplete records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: value {value} is outside {bounds}")]
    OutOfDomain {
        field: FieldKey,
        value: String,
        bounds: String,
    },

    #[error("{field}: no value in session")]
    Missing { field: FieldKey },

    #[error("Invalid record: {0}")]
    Record(String),
}

impl ValidationError {
    pub(crate) fn out_of_domain(field: FieldKey, value: impl fmt::Display) -> Self {
        Self::OutOfDomain {
            field,
            value: value.to_string(),
            bounds: field.spec().domain.bounds_hint(),
        }
    }
}

/// Registry entry: how one field is labelled, seeded and constrained.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub label: &'static str,
    /// Label used in the input summary.
    pub short_label: &'static str,
    pub help: Option<&'static str>,
    pub default: FieldValue,
    pub domain: FieldDomain,
}

/// The fixed set of clinical input fields, indexed by `FieldKey as usize`.
pub static FIELD_REGISTRY: [FieldSpec; 8] = [
    FieldSpec {
        key: FieldKey::Gender,
        label: "Gender",
        short_label: "Gender",
        help: None,
        default: FieldValue::Choice("Female"),
        domain: FieldDomain::Choice(GENDER_OPTIONS),
    },
    FieldSpec {
        key: FieldKey::SmokingHistory,
        label: "Smoking History",
        short_label: "Smoking History",
        help: None,
        default: FieldValue::Choice("never"),
        domain: FieldDomain::Choice(SMOKING_HISTORY_OPTIONS),
    },
    FieldSpec {
        key: FieldKey::Hypertension,
        label: "Hypertension",
        short_label: "Hypertension",
        help: None,
        default: FieldValue::Choice("No"),
        domain: FieldDomain::Choice(YES_NO_OPTIONS),
    },
    FieldSpec {
        key: FieldKey::HeartDisease,
        label: "Heart Disease",
        short_label: "Heart Disease",
        help: None,
        default: FieldValue::Choice("No"),
        domain: FieldDomain::Choice(YES_NO_OPTIONS),
    },
    FieldSpec {
        key: FieldKey::Age,
        label: "Age (years)",
        short_label: "Age",
        help: None,
        default: FieldValue::Integer(30),
        domain: FieldDomain::Integer {
            min: 0,
            max: 120,
            step: 1,
        },
    },
    FieldSpec {
        key: FieldKey::Bmi,
        label: "BMI",
        short_label: "BMI",
        help: Some("Body Mass Index. Normal: 18.5–24.9"),
        default: FieldValue::Decimal(22.0),
        domain: FieldDomain::Decimal {
            min: 10.0,
            max: 60.0,
            step: 0.1,
        },
    },
    FieldSpec {
        key: FieldKey::Hba1c,
        label: "HbA1c Level (%)",
        short_label: "HbA1c",
        help: Some("Avg. blood sugar over past 2–3 months. Normal: <5.7%"),
        default: FieldValue::Decimal(5.5),
        domain: FieldDomain::Decimal {
            min: 3.0,
            max: 15.0,
            step: 0.1,
        },
    },
    FieldSpec {
        key: FieldKey::Glucose,
        label: "Blood Glucose Level (mg/dL)",
        short_label: "Glucose",
        help: Some("Normal fasting: 70–99 mg/dL"),
        default: FieldValue::Decimal(100.0),
        domain: FieldDomain::Decimal {
            min: 50.0,
            max: 300.0,
            step: 1.0,
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_matches_keys() {
        for (i, key) in FieldKey::ALL.iter().enumerate() {
            assert_eq!(FIELD_REGISTRY[i].key, *key);
            assert_eq!(key.spec().key, *key);
        }
    }

    #[test]
    fn test_defaults_lie_in_domain() {
        for spec in &FIELD_REGISTRY {
            assert!(
                spec.domain.contains(&spec.default),
                "default of {} outside its domain",
                spec.key
            );
        }
    }

    #[test]
    fn test_choice_shift_wraps() {
        let domain = FieldKey::Gender.spec().domain;
        assert_eq!(
            domain.shift(FieldValue::Choice("Male"), 1),
            FieldValue::Choice("Female")
        );
        assert_eq!(
            domain.shift(FieldValue::Choice("Female"), -1),
            FieldValue::Choice("Male")
        );
    }

    #[test]
    fn test_numeric_shift_saturates() {
        let age = FieldKey::Age.spec().domain;
        assert_eq!(age.shift(FieldValue::Integer(120), 1), FieldValue::Integer(120));
        assert_eq!(age.shift(FieldValue::Integer(0), -1), FieldValue::Integer(0));

        let bmi = FieldKey::Bmi.spec().domain;
        assert_eq!(bmi.shift(FieldValue::Decimal(22.0), 1), FieldValue::Decimal(22.1));
        assert_eq!(bmi.shift(FieldValue::Decimal(60.0), 5), FieldValue::Decimal(60.0));
    }

    #[test]
    fn test_parse_clamped() {
        let age = FieldKey::Age.spec().domain;
        assert_eq!(age.parse_clamped("85"), Some(FieldValue::Integer(85)));
        assert_eq!(age.parse_clamped("150"), Some(FieldValue::Integer(120)));
        assert_eq!(age.parse_clamped("-4"), Some(FieldValue::Integer(0)));
        assert_eq!(age.parse_clamped("4.5"), None);

        let glucose = FieldKey::Glucose.spec().domain;
        assert_eq!(glucose.parse_clamped("20"), Some(FieldValue::Decimal(50.0)));
        assert_eq!(glucose.parse_clamped("123.456"), Some(FieldValue::Decimal(123.46)));
        assert_eq!(glucose.parse_clamped("abc"), None);
        assert_eq!(glucose.parse_clamped("NaN"), None);
    }

    #[test]
    fn test_contains_rejects_wrong_kind() {
        let bmi = FieldKey::Bmi.spec().domain;
        assert!(!bmi.contains(&FieldValue::Integer(22)));
        assert!(!bmi.contains(&FieldValue::Decimal(9.99)));
        assert!(!FieldKey::Gender.spec().domain.contains(&FieldValue::Choice("Other")));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Decimal(22.0).to_string(), "22.0");
        assert_eq!(FieldValue::Decimal(5.5).to_string(), "5.5");
        assert_eq!(FieldValue::Decimal(100.0).to_string(), "100.0");
        assert_eq!(FieldValue::Decimal(123.46).to_string(), "123.46");
        assert_eq!(FieldValue::Integer(30).to_string(), "30");
        assert_eq!(FieldValue::Choice("No Info").to_string(), "No Info");
    }
}
