//! Prediction record: the single row handed to the classifier.
//!
//! Field names follow the columns the classifier was trained on.

use serde::{Deserialize, Serialize};

use super::field::{FieldKey, ValidationError};
use super::session::SessionState;

/// Feature names in the order the classifier expects them.
pub const FEATURE_NAMES: [&str; 8] = [
    "gender",
    "smoking_history",
    "hypertension",
    "heart_disease",
    "age",
    "bmi",
    "HbA1c_level",
    "blood_glucose_level",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Female" => Ok(Self::Female),
            "Male" => Ok(Self::Male),
            other => Err(ValidationError::out_of_domain(FieldKey::Gender, other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmokingHistory {
    #[serde(rename = "never")]
    Never,
    #[serde(rename = "former")]
    Former,
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "not current")]
    NotCurrent,
    #[serde(rename = "ever")]
    Ever,
    #[serde(rename = "No Info")]
    NoInfo,
}

impl SmokingHistory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Former => "former",
            Self::Current => "current",
            Self::NotCurrent => "not current",
            Self::Ever => "ever",
            Self::NoInfo => "No Info",
        }
    }
}

impl std::str::FromStr for SmokingHistory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(Self::Never),
            "former" => Ok(Self::Former),
            "current" => Ok(Self::Current),
            "not current" => Ok(Self::NotCurrent),
            "ever" => Ok(Self::Ever),
            "No Info" => Ok(Self::NoInfo),
            other => Err(ValidationError::out_of_domain(FieldKey::SmokingHistory, other)),
        }
    }
}

/// Map a yes/no answer to the 0/1 encoding the classifier was trained on.
///
/// # Errors
/// Returns an error for anything other than `"Yes"` or `"No"`.
pub fn yes_no_flag(field: FieldKey, answer: &str) -> Result<u8, ValidationError> {
    match answer {
        "Yes" => Ok(1),
        "No" => Ok(0),
        _ => Err(ValidationError::out_of_domain(field, answer)),
    }
}

/// One row of classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub gender: Gender,
    pub smoking_history: SmokingHistory,
    /// 0 = no, 1 = yes
    pub hypertension: u8,
    /// 0 = no, 1 = yes
    pub heart_disease: u8,
    /// Years, 0-120
    pub age: u32,
    /// kg/m², 10-60
    pub bmi: f64,
    /// %, 3-15
    #[serde(rename = "HbA1c_level")]
    pub hba1c_level: f64,
    /// mg/dL, 50-300
    pub blood_glucose_level: f64,
}

impl PredictionRecord {
    /// Assemble a record from the current session values.
    ///
    /// # Errors
    /// Returns an error if a field is missing or holds a value outside its
    /// domain.
    pub fn from_session(session: &SessionState) -> Result<Self, ValidationError> {
        let choice = |key: FieldKey| -> Result<&'static str, ValidationError> {
            session
                .get(key)
                .and_then(|v| v.as_choice())
                .ok_or(ValidationError::Missing { field: key })
        };
        let decimal = |key: FieldKey| -> Result<f64, ValidationError> {
            session
                .get(key)
                .and_then(|v| v.as_decimal())
                .ok_or(ValidationError::Missing { field: key })
        };

        let age = session
            .get(FieldKey::Age)
            .and_then(|v| v.as_integer())
            .ok_or(ValidationError::Missing {
                field: FieldKey::Age,
            })?;

        let record = Self {
            gender: choice(FieldKey::Gender)?.parse()?,
            smoking_history: choice(FieldKey::SmokingHistory)?.parse()?,
            hypertension: yes_no_flag(FieldKey::Hypertension, choice(FieldKey::Hypertension)?)?,
            heart_disease: yes_no_flag(FieldKey::HeartDisease, choice(FieldKey::HeartDisease)?)?,
            age: u32::try_from(age)
                .map_err(|_| ValidationError::out_of_domain(FieldKey::Age, age))?,
            bmi: decimal(FieldKey::Bmi)?,
            hba1c_level: decimal(FieldKey::Hba1c)?,
            blood_glucose_level: decimal(FieldKey::Glucose)?,
        };

        record
            .validate()
            .map_err(|errors| ValidationError::Record(errors.join(", ")))?;
        Ok(record)
    }

    /// Validate that all features are within the form's ranges.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.age > 120 {
            errors.push(format!("Age {} out of range [0, 120]", self.age));
        }
        if self.hypertension > 1 {
            errors.push(format!("Hypertension {} must be 0 or 1", self.hypertension));
        }
        if self.heart_disease > 1 {
            errors.push(format!("Heart disease {} must be 0 or 1", self.heart_disease));
        }
        if !(10.0..=60.0).contains(&self.bmi) {
            errors.push(format!("BMI {} out of range [10, 60]", self.bmi));
        }
        if !(3.0..=15.0).contains(&self.hba1c_level) {
            errors.push(format!("HbA1c {} out of range [3, 15]", self.hba1c_level));
        }
        if !(50.0..=300.0).contains(&self.blood_glucose_level) {
            errors.push(format!(
                "Blood glucose {} out of range [50, 300]",
                self.blood_glucose_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Categorical feature by column name.
    #[must_use]
    pub fn category(&self, feature: &str) -> Option<&'static str> {
        match feature {
            "gender" => Some(self.gender.as_str()),
            "smoking_history" => Some(self.smoking_history.as_str()),
            _ => None,
        }
    }

    /// Numeric feature by column name.
    #[must_use]
    pub fn numeric(&self, feature: &str) -> Option<f64> {
        match feature {
            "hypertension" => Some(f64::from(self.hypertension)),
            "heart_disease" => Some(f64::from(self.heart_disease)),
            "age" => Some(f64::from(self.age)),
            "bmi" => Some(self.bmi),
            "HbA1c_level" => Some(self.hba1c_level),
            "blood_glucose_level" => Some(self.blood_glucose_level),
            _ => None,
        }
    }
}
