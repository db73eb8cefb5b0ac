//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the form workflow and the externally trained model.

mod classifier;

pub use classifier::{Classifier, ClassifierError};
