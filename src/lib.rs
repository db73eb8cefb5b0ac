//! # diabetes-risk
//!
//! Terminal form that scores a patient's diabetes risk with a pre-trained
//! binary classifier.
//!
//! This crate provides:
//! - A field registry with defaults and bounded domains for eight clinical inputs
//! - A form controller that seeds, resets and submits a per-session state
//! - A classifier adapter for JSON-exported logistic models
//! - Terminal UI for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (field registry, session state, record, result)
//! - `ports`: Trait definitions for the external classifier
//! - `adapters`: Concrete implementations (logistic model, log sanitizer)
//! - `application`: The prediction form controller
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::FormController;
pub use domain::{PredictionRecord, PredictionResult, SessionState};

/// Result type for diabetes-risk operations
pub type Result<T> = std::result::Result<T, RiskError>;

/// Main error type for diabetes-risk
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    #[error("Invalid input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Prediction failed: {0}")]
    Classifier(#[from] ports::ClassifierError),

    #[error("Model could not be loaded: {0}")]
    Model(#[from] adapters::ModelError),
}
