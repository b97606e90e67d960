//! Authentication gate
//!
//! A gate lets any interactive element require a signed-in user before running its
//! action. When the user is signed out, the gate opens a sign-in prompt, drives the
//! sign-in operation, and resumes the original action once the auth source reports
//! an authenticated identity.
//!
//! # State machine
//!
//! ```text
//! Idle --require_auth & unauthenticated--> PromptOpen(loading=false, error=None)
//! PromptOpen --sign in--> PromptOpen(loading=true, error=None)
//! PromptOpen(loading=true) --Failure--> PromptOpen(loading=false, error=E)
//! PromptOpen --status becomes Authenticated--> Idle   [continuation fires]
//! PromptOpen --dismiss--> Idle                        [continuation discarded]
//! Idle --require_auth & authenticated--> Idle         [continuation fires]
//! ```
//!
//! An episode only ever closes successfully through the auth source. The sign-in
//! operation's own `Success` stage is not trusted to carry the identity, so the
//! order in which the two signals arrive does not matter.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Span;

use crate::auth::{AuthStateSource, AuthStatus, Identity};
use crate::sign_in::{SignInFailure, SignInOperation, SignInStage};

/// Gate errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// The controller was torn down or dropped
    #[error("Gate has been torn down")]
    Closed,
}

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, GateError>;

/// A sign-in failure worth showing in the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptError {
    message: String,
}

impl PromptError {
    /// Classify a failure, dropping the ones the user should not see
    pub fn classify(failure: &SignInFailure) -> Option<Self> {
        failure.is_user_visible().then(|| Self {
            message: failure.to_string(),
        })
    }

    /// Message to display
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Gate state
///
/// `PromptOpen` if and only if the sign-in prompt is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    /// No prompt active
    #[default]
    Idle,

    /// Prompt visible
    PromptOpen {
        /// A sign-in attempt is outstanding
        loading: bool,
        /// Set after a failed attempt, cleared on retry or dismissal
        error: Option<PromptError>,
    },
}

impl GateState {
    /// A freshly opened prompt
    pub fn prompt() -> Self {
        GateState::PromptOpen {
            loading: false,
            error: None,
        }
    }

    /// Check if the prompt is showing
    pub fn is_prompt_open(&self) -> bool {
        matches!(self, GateState::PromptOpen { .. })
    }

    /// Check if a sign-in attempt is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(self, GateState::PromptOpen { loading: true, .. })
    }

    /// Current prompt error, if any
    pub fn error(&self) -> Option<&PromptError> {
        match self {
            GateState::PromptOpen { error, .. } => error.as_ref(),
            GateState::Idle => None,
        }
    }
}

/// How a tap is handled while the auth status is still `Loading`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPolicy {
    /// Open the prompt right away, never stalling the tap
    #[default]
    TreatAsUnauthenticated,
    /// Remember the tap and decide once the status resolves
    DeferUntilResolved,
}

/// Gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Label attached to this gate's log events
    pub name: String,

    /// Handling of taps during `Loading`
    pub loading_policy: LoadingPolicy,
}

impl GateConfig {
    /// Create a default configuration with a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the loading policy
    pub fn with_loading_policy(mut self, policy: LoadingPolicy) -> Self {
        self.loading_policy = policy;
        self
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            name: "gate".to_string(),
            loading_policy: LoadingPolicy::default(),
        }
    }
}

/// Events reported by the prompt surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptEvent {
    /// The user asked to sign in (or retry)
    SignIn,
    /// The user closed the prompt
    Dismiss,
}

/// Reconciliation rule
///
/// An open episode resolves exactly when the status carries an identity.
pub fn resolution<'a>(status: &'a AuthStatus, state: &GateState) -> Option<&'a Identity> {
    match (status, state) {
        (AuthStatus::Authenticated(identity), GateState::PromptOpen { .. }) => Some(identity),
        (AuthStatus::Authenticated(_), GateState::Idle)
        | (AuthStatus::Loading | AuthStatus::Unauthenticated, _) => None,
    }
}

type Continuation = Box<dyn Fn(Identity) + Send + Sync>;

/// Mutable gate state, only touched under the controller's lock
#[derive(Debug, Default)]
struct Machine {
    state: GateState,
    /// Last observed auth status
    status: AuthStatus,
    /// Episodes opened so far; the current one while the prompt shows
    episode: u64,
    /// Attempt whose stages are still listened to
    attempt: Option<u64>,
    attempts_started: u64,
    /// A tap arrived during `Loading` under `DeferUntilResolved`
    deferred: bool,
    closed: bool,
}

impl Machine {
    fn new(status: AuthStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    fn open_episode(&mut self) {
        self.episode += 1;
        self.state = GateState::prompt();
        tracing::info!(episode = self.episode, "sign-in prompt opened");
    }

    fn close_episode(&mut self) {
        self.state = GateState::Idle;
        self.attempt = None;
        self.deferred = false;
    }

    /// Re-evaluate the (status, state) pair after any change to either.
    ///
    /// Returns the identity to hand to the continuation.
    fn settle(&mut self) -> Option<Identity> {
        if let Some(identity) = resolution(&self.status, &self.state).cloned() {
            tracing::info!(episode = self.episode, %identity, "sign-in prompt resolved");
            self.close_episode();
            return Some(identity);
        }

        if self.deferred && self.status.is_resolved() {
            self.deferred = false;
            if let Some(identity) = self.status.identity().cloned() {
                tracing::debug!(%identity, "deferred request resolved as authenticated");
                return Some(identity);
            }
            self.open_episode();
        }

        None
    }

    /// Handle a protected action once the pair has settled
    fn request(&mut self, policy: LoadingPolicy) -> Option<Identity> {
        // Any open episode was already resolved by `settle`
        if let Some(identity) = self.status.identity() {
            return Some(identity.clone());
        }

        if self.state.is_prompt_open() {
            tracing::debug!(episode = self.episode, "sign-in prompt already open");
            return None;
        }

        if self.status == AuthStatus::Loading && policy == LoadingPolicy::DeferUntilResolved {
            if !self.deferred {
                self.deferred = true;
                tracing::debug!("auth status loading, deferring request");
            }
            return None;
        }

        self.open_episode();
        None
    }

    fn start_attempt(&mut self) -> Option<u64> {
        match self.state {
            GateState::Idle => {
                tracing::debug!("sign-in requested with no prompt open");
                None
            }
            GateState::PromptOpen { loading: true, .. } => {
                tracing::debug!(attempt = ?self.attempt, "sign-in already in progress");
                None
            }
            GateState::PromptOpen { loading: false, .. } => {
                self.attempts_started += 1;
                let attempt = self.attempts_started;
                self.attempt = Some(attempt);
                self.state = GateState::PromptOpen {
                    loading: true,
                    error: None,
                };
                tracing::info!(episode = self.episode, attempt, "sign-in attempt started");
                Some(attempt)
            }
        }
    }

    fn apply_stage(&mut self, attempt: u64, stage: SignInStage) -> Option<Identity> {
        if self.attempt != Some(attempt) {
            tracing::debug!(attempt, ?stage, "ignoring stage from stale sign-in attempt");
            return None;
        }

        match stage {
            SignInStage::InProgress => None,
            SignInStage::Success => {
                // The identity only counts once the auth source reports it
                tracing::debug!(attempt, "sign-in call completed, awaiting auth status");
                self.settle()
            }
            SignInStage::Failure(failure) => {
                let error = PromptError::classify(&failure);
                if error.is_some() {
                    tracing::warn!(attempt, %failure, "sign-in failed");
                } else {
                    tracing::debug!(attempt, %failure, "sign-in failed silently");
                }
                self.attempt = None;
                self.state = GateState::PromptOpen {
                    loading: false,
                    error,
                };
                None
            }
        }
    }
}

struct Inner {
    config: GateConfig,
    span: Span,
    machine: Mutex<Machine>,
    state_tx: watch::Sender<GateState>,
    source: Arc<dyn AuthStateSource>,
    operation: Arc<dyn SignInOperation>,
    on_authenticated: Continuation,
    runtime: Handle,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Inner {
    /// Run `f` under the lock, publish the resulting state, then fire the
    /// continuation outside the lock.
    fn transition<F>(&self, f: F)
    where
        F: FnOnce(&mut Machine) -> Option<Identity>,
    {
        let _span = self.span.enter();
        let fire = {
            let mut machine = self.machine.lock();
            if machine.closed {
                tracing::debug!("gate closed, ignoring event");
                return;
            }
            let fire = f(&mut *machine);
            self.publish(&machine);
            fire
        };

        if let Some(identity) = fire {
            (self.on_authenticated)(identity);
        }
    }

    fn publish(&self, machine: &Machine) {
        self.state_tx.send_if_modified(|published| {
            if *published == machine.state {
                false
            } else {
                *published = machine.state.clone();
                true
            }
        });
    }

    /// Read the source's status into the machine
    ///
    /// Called under the machine lock so that no other input can interleave
    /// between reading the status and acting on it.
    fn refresh_status(&self, machine: &mut Machine) {
        machine.status = self.source.current();
    }

    fn require_auth(&self) {
        let policy = self.config.loading_policy;
        self.transition(|machine| {
            self.refresh_status(machine);
            machine.settle().or_else(|| machine.request(policy))
        });
    }

    fn observe_status(&self) {
        self.transition(|machine| {
            self.refresh_status(machine);
            machine.settle()
        });
    }

    fn on_stage(&self, attempt: u64, stage: SignInStage) {
        self.transition(|machine| {
            self.refresh_status(machine);
            machine.apply_stage(attempt, stage)
        });
    }

    fn sign_in(self: &Arc<Self>) {
        let mut started = None;
        self.transition(|machine| {
            started = machine.start_attempt();
            None
        });
        let Some(attempt) = started else {
            return;
        };

        let stages = {
            let _runtime = self.runtime.enter();
            self.operation.start()
        };
        let listener = self
            .runtime
            .spawn(listen_to_attempt(Arc::downgrade(self), attempt, stages));
        self.track(listener);
    }

    fn dismiss(&self) {
        self.transition(|machine| {
            match &machine.state {
                GateState::PromptOpen { loading, .. } => {
                    tracing::info!(
                        episode = machine.episode,
                        in_flight = *loading,
                        "sign-in prompt dismissed"
                    );
                }
                GateState::Idle => tracing::debug!("dismiss with no prompt open"),
            }
            machine.close_episode();
            None
        });
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock();
        if self.machine.lock().closed {
            task.abort();
            return;
        }
        tasks.retain(|running| !running.is_finished());
        tasks.push(task);
    }

    fn teardown(&self) {
        let _span = self.span.enter();
        {
            let mut machine = self.machine.lock();
            if machine.closed {
                return;
            }
            machine.close_episode();
            machine.closed = true;
        }
        // Always notify, even if already idle, so waiting subscribers observe the close
        self.state_tx.send_replace(GateState::Idle);

        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        tracing::debug!("gate torn down");
    }

    fn is_closed(&self) -> bool {
        self.machine.lock().closed
    }
}

/// Wake the gate on every status change until it goes away
///
/// The gate re-reads the status itself; the value carried by the channel may
/// already be stale by the time the lock is taken.
async fn watch_status(gate: Weak<Inner>, mut status_rx: watch::Receiver<AuthStatus>) {
    while status_rx.changed().await.is_ok() {
        let Some(inner) = gate.upgrade() else {
            return;
        };
        inner.observe_status();
    }
    tracing::debug!("auth status source closed");
}

/// Forward one attempt's stages to the gate
async fn listen_to_attempt(
    gate: Weak<Inner>,
    attempt: u64,
    mut stages: mpsc::Receiver<SignInStage>,
) {
    while let Some(stage) = stages.recv().await {
        let terminal = stage.is_terminal();
        let Some(inner) = gate.upgrade() else {
            return;
        };
        inner.on_stage(attempt, stage);
        if terminal {
            return;
        }
    }

    if let Some(inner) = gate.upgrade() {
        inner.on_stage(attempt, SignInStage::Failure(SignInFailure::Interrupted));
    }
}

/// Gate controller
///
/// One controller guards one protected surface and is bound to one success
/// continuation. All inputs (taps, sign-in stages, status changes) are serialized
/// through a short-held lock, and the continuation always runs outside it.
///
/// The controller subscribes to the auth source for its whole lifetime. Dropping
/// it (or calling [`GateController::teardown`]) unsubscribes and stops listening to
/// any sign-in attempt still running.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use app_state::auth::{AuthStatus, AuthStatusStore};
/// use app_state::gate::GateController;
/// use app_state::sign_in::sign_in_fn;
///
/// #[tokio::main]
/// async fn main() {
///     let auth = Arc::new(AuthStatusStore::with_status(AuthStatus::Unauthenticated));
///     let operation = Arc::new(sign_in_fn(|| async { Ok(()) }));
///
///     let gate = GateController::new(auth, operation, |identity| {
///         println!("liking post as {}", identity.handle);
///     });
///
///     // Signed out: opens the prompt instead of running the action
///     gate.require_auth();
///     assert!(gate.state().is_prompt_open());
/// }
/// ```
pub struct GateController {
    inner: Arc<Inner>,
}

impl GateController {
    /// Create a gate with the default configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new<F>(
        source: Arc<dyn AuthStateSource>,
        operation: Arc<dyn SignInOperation>,
        on_authenticated: F,
    ) -> Self
    where
        F: Fn(Identity) + Send + Sync + 'static,
    {
        Self::with_config(GateConfig::default(), source, operation, on_authenticated)
    }

    /// Create a gate with a custom configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_config<F>(
        config: GateConfig,
        source: Arc<dyn AuthStateSource>,
        operation: Arc<dyn SignInOperation>,
        on_authenticated: F,
    ) -> Self
    where
        F: Fn(Identity) + Send + Sync + 'static,
    {
        let runtime = Handle::current();
        let span = tracing::info_span!("auth_gate", gate = %config.name);

        let mut status_rx = source.subscribe();
        let initial = status_rx.borrow_and_update().clone();
        let (state_tx, _) = watch::channel(GateState::Idle);

        let inner = Arc::new(Inner {
            config,
            span,
            machine: Mutex::new(Machine::new(initial)),
            state_tx,
            source,
            operation,
            on_authenticated: Box::new(on_authenticated),
            runtime,
            tasks: Mutex::new(Vec::new()),
        });

        let watcher = inner
            .runtime
            .spawn(watch_status(Arc::downgrade(&inner), status_rx));
        inner.track(watcher);

        Self { inner }
    }

    /// Run the protected action, prompting for sign-in first if needed
    ///
    /// Signed in: the continuation runs synchronously with the identity.
    /// Otherwise the prompt opens, unless it is already open.
    pub fn require_auth(&self) {
        self.inner.require_auth();
    }

    /// Start a sign-in attempt from the prompt
    ///
    /// Ignored when no prompt is open or an attempt is already outstanding.
    pub fn sign_in(&self) {
        self.inner.sign_in();
    }

    /// Close the prompt and discard the pending action
    pub fn dismiss(&self) {
        self.inner.dismiss();
    }

    /// Handle an event from the prompt surface
    pub fn handle_event(&self, event: PromptEvent) {
        match event {
            PromptEvent::SignIn => self.sign_in(),
            PromptEvent::Dismiss => self.dismiss(),
        }
    }

    /// Current gate state
    pub fn state(&self) -> GateState {
        self.inner.machine.lock().state.clone()
    }

    /// Subscribe to gate state changes
    pub fn subscribe_state(&self) -> watch::Receiver<GateState> {
        self.inner.state_tx.subscribe()
    }

    /// Number of prompt episodes opened so far
    pub fn episode_count(&self) -> u64 {
        self.inner.machine.lock().episode
    }

    /// Number of sign-in attempts started so far
    pub fn attempt_count(&self) -> u64 {
        self.inner.machine.lock().attempts_started
    }

    /// Get a handle for the prompt surface
    pub fn handle(&self) -> GateHandle {
        GateHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Stop all subscriptions and close the prompt
    ///
    /// Later events are ignored. Called automatically on drop.
    pub fn teardown(&self) {
        self.inner.teardown();
    }

    /// Check if the gate was torn down
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl Drop for GateController {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl fmt::Debug for GateController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateController")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Cloneable handle to a gate
///
/// Does not keep the gate alive. Every call fails with [`GateError::Closed`]
/// once the controller is torn down or dropped.
#[derive(Debug, Clone)]
pub struct GateHandle {
    inner: Weak<Inner>,
}

impl GateHandle {
    fn upgrade(&self) -> Result<Arc<Inner>> {
        let inner = self.inner.upgrade().ok_or(GateError::Closed)?;
        if inner.is_closed() {
            return Err(GateError::Closed);
        }
        Ok(inner)
    }

    /// Forward a prompt event
    pub fn dispatch(&self, event: PromptEvent) -> Result<()> {
        let inner = self.upgrade()?;
        match event {
            PromptEvent::SignIn => inner.sign_in(),
            PromptEvent::Dismiss => inner.dismiss(),
        }
        Ok(())
    }

    /// Trigger the protected action
    pub fn require_auth(&self) -> Result<()> {
        self.upgrade()?.require_auth();
        Ok(())
    }

    /// Current gate state
    pub fn state(&self) -> Result<GateState> {
        Ok(self.upgrade()?.machine.lock().state.clone())
    }
}
