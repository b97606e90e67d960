//! Buttons whose action requires a signed-in user

use app_state::gate::{GateController, GateError, GateHandle};

use crate::components::Button;

/// A button wired to an auth gate
///
/// Pressing it runs the gate's protected action, or opens the sign-in prompt
/// when nobody is signed in.
#[derive(Debug, Clone)]
pub struct GatedButton {
    button: Button,
    gate: GateHandle,
}

impl GatedButton {
    /// Wire a button to a gate
    pub fn new(button: Button, gate: &GateController) -> Self {
        Self {
            button,
            gate: gate.handle(),
        }
    }

    /// Button props for rendering
    pub fn button(&self) -> &Button {
        &self.button
    }

    /// Replace the button props, e.g. to toggle its disabled state
    pub fn set_button(&mut self, button: Button) {
        self.button = button;
    }

    /// Handle a press
    ///
    /// Presses on a disabled or loading button are ignored.
    pub fn press(&self) -> Result<(), GateError> {
        if !self.button.is_interactive() {
            tracing::debug!(label = %self.button.label, "press on inactive gated button");
            return Ok(());
        }
        self.gate.require_auth()
    }
}
