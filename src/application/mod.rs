//! Application layer: the prediction form workflow.
//!
//! This module orchestrates the domain types with the classifier port.

mod controller;

pub use controller::{summarize, ControlKind, FormAction, FormController, FormView, InputControl};
