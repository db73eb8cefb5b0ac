//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: JSON-exported logistic model implementing `Classifier`
//! - `sanitize`: clinical value filtering for logs

pub mod logistic;
pub mod sanitize;

pub use logistic::{LogisticModel, ModelError};
