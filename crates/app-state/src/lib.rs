//! Application state management for Aurora Compass
//!
//! This crate provides reactive authentication state and the auth gate that
//! protects interactive elements behind a sign-in prompt.
//!
//! # Modules
//!
//! - [`auth`] - Live authentication status and its watch-backed store
//! - [`sign_in`] - Sign-in operation contract and stage reporting
//! - [`gate`] - Gate controller reconciling taps, sign-in stages and status changes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod gate;
pub mod sign_in;

pub use auth::{AuthStateSource, AuthStatus, AuthStatusStore, Identity};
pub use gate::{
    GateConfig, GateController, GateError, GateHandle, GateState, LoadingPolicy, PromptError,
    PromptEvent,
};
pub use sign_in::{sign_in_fn, SignInFailure, SignInFn, SignInOperation, SignInStage};
