//! User interface for Aurora Compass
//!
//! This crate provides the presentation side of the auth gate: the component
//! props the frontend renders, the sign-in prompt built from a gate's state, and
//! buttons that require a signed-in user.
//!
//! # Modules
//!
//! - [`components`] - Button, loader and dialog component props
//! - [`auth_prompt`] - Sign-in prompt view model and press routing
//! - [`gated`] - Buttons guarded by an auth gate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use app_state::{sign_in_fn, AuthStatus, AuthStatusStore, GateController};
//! use app_ui::{Button, GatedButton, SignInPromptPresenter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let auth = Arc::new(AuthStatusStore::with_status(AuthStatus::Unauthenticated));
//!     let gate = GateController::new(auth, Arc::new(sign_in_fn(|| async { Ok(()) })), |id| {
//!         println!("followed as {}", id.handle);
//!     });
//!
//!     let follow = GatedButton::new(Button::new("Follow"), &gate);
//!     let prompt = SignInPromptPresenter::new(&gate);
//!
//!     follow.press().unwrap();
//!     assert!(prompt.dialog().is_some());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth_prompt;
pub mod components;
pub mod gated;

// Re-export commonly used types
pub use auth_prompt::{
    parse_action, PromptActionError, SignInPrompt, SignInPromptConfig, SignInPromptPresenter,
    DISMISS_ACTION, SIGN_IN_ACTION,
};

pub use components::{
    AccessibilityProps, Button, ButtonColor, ButtonSize, ButtonVariant, Dialog, DialogButton,
    DialogNotice, DialogPresentation, Loader, LoaderSize, NoticeTone,
};

pub use gated::GatedButton;
