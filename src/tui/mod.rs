//! TUI module: Terminal User Interface using Ratatui.
//!
//! One screen: the clinical input form beside the prediction panel.

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
