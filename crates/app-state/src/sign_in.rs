//! Sign-in operation contract
//!
//! A sign-in operation is started with no arguments and reports its progress as a
//! sequence of [`SignInStage`]s: zero or more `InProgress` updates followed by
//! exactly one terminal `Success` or `Failure`.

use std::future::Future;
use thiserror::Error;
use tokio::sync::mpsc;

/// Default channel capacity for stage updates
pub const DEFAULT_STAGE_BUFFER: usize = 8;

/// Reasons a sign-in attempt can fail
///
/// The `Display` text is what a prompt shows for user-visible failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignInFailure {
    /// The user backed out of the credential picker
    #[error("Sign-in was cancelled")]
    Cancelled,

    /// The credential provider had nothing to offer
    #[error("No saved credentials are available")]
    NoCredential,

    /// The stage stream ended without a terminal stage
    #[error("Sign-in ended without a result")]
    Interrupted,

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Credential provider error
    #[error("{0}")]
    Provider(String),
}

impl SignInFailure {
    /// Whether this failure is worth showing to the user
    ///
    /// Cancellation and missing credentials are the user's own choices or
    /// non-actionable, so they stay silent.
    pub fn is_user_visible(&self) -> bool {
        match self {
            SignInFailure::Cancelled | SignInFailure::NoCredential | SignInFailure::Interrupted => {
                false
            }
            SignInFailure::Network(_)
            | SignInFailure::InvalidCredentials
            | SignInFailure::Provider(_) => true,
        }
    }
}

/// One update from a running sign-in attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInStage {
    /// Still working
    InProgress,
    /// The sign-in call completed
    Success,
    /// The sign-in call failed
    Failure(SignInFailure),
}

impl SignInStage {
    /// Whether this stage ends the attempt
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignInStage::InProgress)
    }
}

/// An asynchronous sign-in operation
///
/// `start` must not block; it hands back a receiver that the caller drains.
/// Dropping the receiver means nobody is listening anymore, not that the
/// underlying call must stop.
#[cfg_attr(test, mockall::automock)]
pub trait SignInOperation: Send + Sync {
    /// Begin a sign-in attempt
    fn start(&self) -> mpsc::Receiver<SignInStage>;
}

/// [`SignInOperation`] backed by an async closure
///
/// Each `start` spawns the future on the current Tokio runtime, emits
/// `InProgress`, then the terminal stage for the future's result.
pub struct SignInFn<F> {
    f: F,
    buffer: usize,
}

/// Wrap an async closure as a [`SignInOperation`]
///
/// # Example
///
/// ```no_run
/// use app_state::sign_in::{sign_in_fn, SignInFailure};
///
/// let operation = sign_in_fn(|| async {
///     // call the credential provider here
///     Err::<(), _>(SignInFailure::Network("offline".to_string()))
/// });
/// ```
pub fn sign_in_fn<F, Fut>(f: F) -> SignInFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SignInFailure>> + Send + 'static,
{
    SignInFn {
        f,
        buffer: DEFAULT_STAGE_BUFFER,
    }
}

impl<F> SignInFn<F> {
    /// Set the stage channel capacity
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

impl<F, Fut> SignInOperation for SignInFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SignInFailure>> + Send + 'static,
{
    fn start(&self) -> mpsc::Receiver<SignInStage> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let call = (self.f)();

        tokio::spawn(async move {
            let _ = tx.send(SignInStage::InProgress).await;

            let stage = match call.await {
                Ok(()) => SignInStage::Success,
                Err(failure) => SignInStage::Failure(failure),
            };

            // Receiver may be gone if the gate was torn down
            let _ = tx.send(stage).await;
        });

        rx
    }
}
