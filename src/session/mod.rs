//! Capture session management module
//!
//! This module contains:
//! - The flow state machine (state.rs)
//! - The UI view-model with its status line (ui.rs)
//! - The controller that handles every user event (controller.rs)

pub mod controller;
pub mod state;
pub mod ui;

pub use controller::Controller;
pub use state::{FlowEvent, FlowState, InvalidTransition};
pub use ui::{Control, ControlState, NumberLine, Status, UiState};
