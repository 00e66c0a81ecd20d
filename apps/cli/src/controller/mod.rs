//! Controller layer: terminal actions and their dispatch onto the view state machine.

pub mod actions;
pub mod orchestration;
