//! Sign-in prompt surface
//!
//! This module turns a gate's [`GateState`] into a renderable sign-in prompt and
//! routes the prompt's button presses back into the gate.
//!
//! The prompt only exists while the gate is `PromptOpen`, and its sign-in button
//! is disabled while an attempt is outstanding.

use app_state::gate::{GateController, GateError, GateHandle, GateState, PromptEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::components::{
    Button, ButtonColor, ButtonVariant, Dialog, DialogButton, DialogNotice, DialogPresentation,
    Loader, LoaderSize,
};

/// Action id emitted by the sign-in button
pub const SIGN_IN_ACTION: &str = "sign_in";

/// Action id emitted by the cancel button and the dialog's close gesture
pub const DISMISS_ACTION: &str = "dismiss";

/// Prompt action errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptActionError {
    /// The frontend sent an action this prompt does not have
    #[error("Unknown prompt action: {0}")]
    UnknownAction(String),

    /// The gate is gone
    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Map a frontend action id to a gate event
pub fn parse_action(action_id: &str) -> Result<PromptEvent, PromptActionError> {
    match action_id {
        SIGN_IN_ACTION => Ok(PromptEvent::SignIn),
        DISMISS_ACTION | "cancel" => Ok(PromptEvent::Dismiss),
        other => Err(PromptActionError::UnknownAction(other.to_string())),
    }
}

/// Prompt copy and presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignInPromptConfig {
    /// Dialog ID
    pub id: String,
    /// Title text
    pub title: String,
    /// Body text
    pub description: String,
    /// Sign-in button label
    pub sign_in_label: String,
    /// Sign-in button label after a failure
    pub retry_label: String,
    /// Cancel button label
    pub cancel_label: String,
    /// Spinner label announced while signing in
    pub loading_label: String,
    /// Presentation style
    pub presentation: DialogPresentation,
}

impl Default for SignInPromptConfig {
    fn default() -> Self {
        Self {
            id: "sign-in-prompt".to_string(),
            title: "Sign in required".to_string(),
            description: "Sign in to continue.".to_string(),
            sign_in_label: "Sign in".to_string(),
            retry_label: "Try again".to_string(),
            cancel_label: "Cancel".to_string(),
            loading_label: "Signing in".to_string(),
            presentation: DialogPresentation::BottomSheet,
        }
    }
}

/// Rendered sign-in prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInPrompt {
    /// Dialog ID
    pub id: String,
    /// Title text
    pub title: String,
    /// Body text
    pub description: String,
    /// A sign-in attempt is outstanding
    pub loading: bool,
    /// Failure message from the last attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Sign-in (or retry) control
    pub sign_in: Button,
    /// Dismiss control
    pub cancel: Button,
    /// Presentation style
    pub presentation: DialogPresentation,
}

impl SignInPrompt {
    /// Build the prompt for a gate state
    ///
    /// Returns `None` while the gate is idle.
    pub fn from_state(state: &GateState, config: &SignInPromptConfig) -> Option<Self> {
        let GateState::PromptOpen { loading, error } = state else {
            return None;
        };
        let loading = *loading;
        let error = error.as_ref().map(|e| e.message().to_string());

        let label = if error.is_some() {
            &config.retry_label
        } else {
            &config.sign_in_label
        };
        let sign_in = Button::new(label.clone())
            .with_color(ButtonColor::Primary)
            .on_press(SIGN_IN_ACTION)
            .disabled(loading)
            .loading(loading)
            .with_test_id("sign-in-prompt-submit");
        let cancel = Button::new(config.cancel_label.clone())
            .with_variant(ButtonVariant::Ghost)
            .with_color(ButtonColor::Secondary)
            .on_press(DISMISS_ACTION)
            .with_test_id("sign-in-prompt-cancel");

        Some(Self {
            id: config.id.clone(),
            title: config.title.clone(),
            description: config.description.clone(),
            loading,
            error,
            sign_in,
            cancel,
            presentation: config.presentation,
        })
    }

    /// Whether the sign-in control accepts presses
    pub fn can_sign_in(&self) -> bool {
        self.sign_in.is_interactive()
    }

    /// Convert to an open [`Dialog`]
    pub fn to_dialog(&self, config: &SignInPromptConfig) -> Dialog {
        let mut dialog = Dialog::new()
            .with_id(self.id.clone())
            .with_title(self.title.clone())
            .with_description(self.description.clone())
            .with_presentation(self.presentation)
            .with_button(DialogButton::from_button(&self.sign_in, true))
            .with_button(DialogButton::from_button(&self.cancel, false).with_close(true))
            .on_close(DISMISS_ACTION);

        if let Some(error) = &self.error {
            dialog = dialog.with_notice(DialogNotice::error(error.clone()));
        }
        if self.loading {
            dialog = dialog.with_loader(
                Loader::new()
                    .with_size(LoaderSize::Sm)
                    .with_label(config.loading_label.clone()),
            );
        }

        dialog.open();
        dialog
    }
}

/// Binds a gate to its prompt surface
///
/// Renders the gate's published state and forwards button presses. Presses on a
/// disabled sign-in button are swallowed here, the gate ignores them as well.
#[derive(Debug)]
pub struct SignInPromptPresenter {
    handle: GateHandle,
    states: watch::Receiver<GateState>,
    config: SignInPromptConfig,
}

impl SignInPromptPresenter {
    /// Create a presenter with default copy
    pub fn new(gate: &GateController) -> Self {
        Self::with_config(gate, SignInPromptConfig::default())
    }

    /// Create a presenter with custom copy
    pub fn with_config(gate: &GateController, config: SignInPromptConfig) -> Self {
        Self {
            handle: gate.handle(),
            states: gate.subscribe_state(),
            config,
        }
    }

    /// Current prompt, `None` while the gate is idle
    pub fn current(&self) -> Option<SignInPrompt> {
        SignInPrompt::from_state(&self.states.borrow(), &self.config)
    }

    /// Current prompt as a dialog
    pub fn dialog(&self) -> Option<Dialog> {
        self.current().map(|prompt| prompt.to_dialog(&self.config))
    }

    /// Wait for the next state change and render it
    ///
    /// Fails with [`GateError::Closed`] once the gate is torn down or dropped.
    pub async fn changed(&mut self) -> Result<Option<SignInPrompt>, GateError> {
        self.handle.state()?;
        self.states.changed().await.map_err(|_| GateError::Closed)?;
        // Teardown wakes subscribers one last time
        self.handle.state()?;
        Ok(SignInPrompt::from_state(
            &self.states.borrow_and_update(),
            &self.config,
        ))
    }

    /// Handle a button press from the frontend
    pub fn press(&self, action_id: &str) -> Result<(), PromptActionError> {
        let event = parse_action(action_id)?;

        if event == PromptEvent::SignIn {
            match self.current() {
                Some(prompt) if prompt.can_sign_in() => {}
                Some(_) => {
                    tracing::debug!("sign-in pressed while disabled");
                    return Ok(());
                }
                None => {
                    tracing::debug!("sign-in pressed with no prompt shown");
                    return Ok(());
                }
            }
        }

        self.handle.dispatch(event)?;
        Ok(())
    }
}
