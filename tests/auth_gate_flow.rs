//! Auth gate integration tests
//!
//! End-to-end flows through the gate controller and the sign-in prompt surface.

use app_state::{
    AuthStatus, AuthStatusStore, GateConfig, GateController, GateState, Identity, LoadingPolicy,
    SignInFailure, SignInOperation, SignInStage,
};
use app_ui::{SignInPromptPresenter, DISMISS_ACTION, SIGN_IN_ACTION};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Sign-in provider driven by the test, one channel per attempt
#[derive(Default)]
struct ManualProvider {
    attempts: Mutex<Vec<mpsc::Sender<SignInStage>>>,
}

impl ManualProvider {
    fn attempt(&self, index: usize) -> mpsc::Sender<SignInStage> {
        self.attempts.lock().unwrap()[index].clone()
    }

    fn started(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

impl SignInOperation for ManualProvider {
    fn start(&self) -> mpsc::Receiver<SignInStage> {
        let (tx, rx) = mpsc::channel(8);
        self.attempts.lock().unwrap().push(tx);
        rx
    }
}

struct App {
    auth: Arc<AuthStatusStore>,
    provider: Arc<ManualProvider>,
    gate: GateController,
    prompt: SignInPromptPresenter,
    actions: Arc<Mutex<Vec<Identity>>>,
}

fn app(status: AuthStatus, config: GateConfig) -> App {
    init_tracing();
    let auth = Arc::new(AuthStatusStore::with_status(status));
    let provider = Arc::new(ManualProvider::default());
    let actions = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&actions);
    let gate = GateController::with_config(config, auth.clone(), provider.clone(), move |id| {
        recorded.lock().unwrap().push(id);
    });
    let prompt = SignInPromptPresenter::new(&gate);

    App {
        auth,
        provider,
        gate,
        prompt,
        actions,
    }
}

impl App {
    fn actions(&self) -> Vec<Identity> {
        self.actions.lock().unwrap().clone()
    }
}

fn user42() -> Identity {
    Identity::new("did:plc:user42", "user42.bsky.social")
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn finish(tx: &mpsc::Sender<SignInStage>, stage: SignInStage) {
    tx.send(stage).await.unwrap();
    tx.closed().await;
}

/// Unauthenticated → prompt → failure → retry → authenticated elsewhere
#[tokio::test(start_paused = true)]
async fn test_failure_then_retry_then_authenticated() {
    let app = app(AuthStatus::Unauthenticated, GateConfig::named("like"));

    app.gate.require_auth();
    assert_eq!(app.gate.state(), GateState::prompt());
    let prompt = app.prompt.current().unwrap();
    assert!(prompt.can_sign_in());
    assert!(prompt.error.is_none());

    app.prompt.press(SIGN_IN_ACTION).unwrap();
    let prompt = app.prompt.current().unwrap();
    assert!(prompt.loading);
    assert!(prompt.sign_in.disabled);

    finish(
        &app.provider.attempt(0),
        SignInStage::Failure(SignInFailure::Network("network".into())),
    )
    .await;
    let prompt = app.prompt.current().unwrap();
    assert!(!prompt.loading);
    assert_eq!(prompt.error.as_deref(), Some("Network error: network"));
    assert_eq!(prompt.sign_in.label, "Try again");

    app.prompt.press(SIGN_IN_ACTION).unwrap();
    let prompt = app.prompt.current().unwrap();
    assert!(prompt.loading);
    assert!(prompt.error.is_none());

    app.auth.set_authenticated(user42());
    settle().await;

    assert_eq!(app.gate.state(), GateState::Idle);
    assert!(app.prompt.current().is_none());
    assert_eq!(app.actions(), vec![user42()]);
    assert_eq!(app.provider.started(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_signed_in_user_never_sees_prompt() {
    let app = app(AuthStatus::Authenticated(user42()), GateConfig::default());

    for _ in 0..5 {
        app.gate.require_auth();
        assert!(app.prompt.current().is_none());
    }

    assert_eq!(app.actions().len(), 5);
    assert_eq!(app.gate.episode_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_double_tap_opens_one_prompt() {
    let app = app(AuthStatus::Unauthenticated, GateConfig::default());

    app.gate.require_auth();
    app.gate.require_auth();

    assert_eq!(app.gate.episode_count(), 1);
    assert!(app.prompt.current().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_mid_sign_in_discards_action() {
    let app = app(AuthStatus::Unauthenticated, GateConfig::default());

    app.gate.require_auth();
    app.prompt.press(SIGN_IN_ACTION).unwrap();
    app.prompt.press(DISMISS_ACTION).unwrap();
    assert!(app.prompt.current().is_none());

    // Sign-in finishes in the background after the user walked away
    finish(&app.provider.attempt(0), SignInStage::Success).await;
    app.auth.set_authenticated(user42());
    settle().await;

    assert_eq!(app.gate.state(), GateState::Idle);
    assert!(app.actions().is_empty());

    // The next tap goes straight through
    app.gate.require_auth();
    assert_eq!(app.actions(), vec![user42()]);
}

#[tokio::test(start_paused = true)]
async fn test_late_failure_after_dismiss_sets_no_error() {
    let app = app(AuthStatus::Unauthenticated, GateConfig::default());

    app.gate.require_auth();
    app.prompt.press(SIGN_IN_ACTION).unwrap();
    app.prompt.press(DISMISS_ACTION).unwrap();

    app.gate.require_auth();
    finish(
        &app.provider.attempt(0),
        SignInStage::Failure(SignInFailure::InvalidCredentials),
    )
    .await;

    let prompt = app.prompt.current().unwrap();
    assert!(prompt.error.is_none());
    assert!(!prompt.loading);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_sign_in_is_silent() {
    let app = app(AuthStatus::Unauthenticated, GateConfig::default());

    app.gate.require_auth();
    app.prompt.press(SIGN_IN_ACTION).unwrap();
    finish(
        &app.provider.attempt(0),
        SignInStage::Failure(SignInFailure::Cancelled),
    )
    .await;

    let prompt = app.prompt.current().unwrap();
    assert!(prompt.error.is_none());
    assert!(prompt.can_sign_in());
}

#[tokio::test(start_paused = true)]
async fn test_success_and_status_in_either_order() {
    // Status first, then the provider's own success
    let app1 = app(AuthStatus::Unauthenticated, GateConfig::default());
    app1.gate.require_auth();
    app1.gate.sign_in();
    app1.auth.set_authenticated(user42());
    settle().await;
    finish(&app1.provider.attempt(0), SignInStage::Success).await;
    assert_eq!(app1.actions(), vec![user42()]);

    // Provider success first, then the status
    let app2 = app(AuthStatus::Unauthenticated, GateConfig::default());
    app2.gate.require_auth();
    app2.gate.sign_in();
    finish(&app2.provider.attempt(0), SignInStage::Success).await;
    assert!(app2.gate.state().is_loading());
    app2.auth.set_authenticated(user42());
    settle().await;
    assert_eq!(app2.actions(), vec![user42()]);
}

#[tokio::test(start_paused = true)]
async fn test_deferred_tap_during_startup() {
    let config = GateConfig::named("startup").with_loading_policy(LoadingPolicy::DeferUntilResolved);
    let app = app(AuthStatus::Loading, config);

    app.gate.require_auth();
    assert!(app.prompt.current().is_none());

    // Session restore finishes
    app.auth.set_authenticated(user42());
    settle().await;

    assert_eq!(app.actions(), vec![user42()]);
    assert!(app.prompt.current().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_prompt_state_serializes_for_frontend() {
    let app = app(AuthStatus::Unauthenticated, GateConfig::default());
    app.gate.require_auth();
    app.prompt.press(SIGN_IN_ACTION).unwrap();

    let dialog = app.prompt.dialog().unwrap();
    let json = serde_json::to_value(&dialog).unwrap();

    assert_eq!(json["id"], "sign-in-prompt");
    assert_eq!(json["is_open"], true);
    assert_eq!(json["buttons"][0]["action_id"], SIGN_IN_ACTION);
    assert_eq!(json["buttons"][0]["disabled"], true);
    assert_eq!(json["loader"]["label"], "Signing in");
}
