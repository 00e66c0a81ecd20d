//! Routing from parsed terminal actions to the view state machine.

use std::sync::Arc;

use client_core::ViewStateMachine;
use tracing::debug;

use crate::controller::actions::UiAction;

/// What the input loop should do after an action has been handed off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Redraw,
    Help,
    Quit,
}

/// Runs an action to completion, including any network round trip it starts.
pub async fn run_action(machine: &Arc<ViewStateMachine>, action: UiAction) -> Flow {
    match action {
        UiAction::SubmitLogin(credentials) => {
            // Failures already sit in the error slot.
            let _ = machine.submit_login(credentials).await;
            Flow::Continue
        }
        UiAction::SubmitCar => {
            let _ = machine.submit_car_form().await;
            Flow::Continue
        }
        action => dispatch_action(machine, action),
    }
}

/// Hands an action to the state machine without waiting on the network, so
/// the input loop keeps accepting commands while a submit is outstanding.
pub fn dispatch_action(machine: &Arc<ViewStateMachine>, action: UiAction) -> Flow {
    let cmd_name = action.name();

    let flow = match action {
        action @ (UiAction::SubmitLogin(_) | UiAction::SubmitCar) => {
            let machine = Arc::clone(machine);
            tokio::spawn(async move {
                run_action(&machine, action).await;
            });
            Flow::Continue
        }
        UiAction::Navigate(page) => {
            machine.navigate(page);
            Flow::Continue
        }
        UiAction::SetField { field, value } => {
            machine.edit_car_form(|form| form.set_field(field, value));
            Flow::Continue
        }
        UiAction::ToggleConnector(connector) => {
            let selected = machine.edit_car_form(|form| form.toggle_connector(connector));
            debug!(%connector, selected, "toggled connector");
            Flow::Continue
        }
        UiAction::Logout => {
            machine.logout();
            Flow::Continue
        }
        UiAction::Show => Flow::Redraw,
        UiAction::Help => Flow::Help,
        UiAction::Quit => Flow::Quit,
    };

    debug!(command = cmd_name, ?flow, "dispatched ui action");
    flow
}
