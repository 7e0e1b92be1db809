//! Push notification token registration for the native mobile shell.
//!
//! Flow: ask for permission, ask the OS push service for a token (bounded by a
//! timeout), persist it locally and send it to the backend with bounded
//! retries. A token that never got confirmed is re-sent the next time the
//! authenticated layout mounts. Every failure is logged and swallowed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use hcms_api::models::{PushPlatform, PushTokenRecord, PushTokenRegistration};
use hcms_api::{PortalClient, RetryPolicy};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::local_store::LocalStore;

pub const PUSH_TOKEN_KEY: &str = "push_token";
pub const PUSH_TOKEN_REGISTERED_KEY: &str = "push_token_registered";
pub const TOKEN_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PushState {
    Unrequested,
    /// Not running inside the native shell.
    Skipped,
    Denied,
    Failed,
    TokenObtained,
    Registered,
    /// Token stored locally but the backend never confirmed it.
    PendingRetry,
}

/// Token (or native registration error) delivered by the OS push service.
pub type TokenDelivery = oneshot::Receiver<Result<String, String>>;

/// Platform push service as seen from Rust.
#[async_trait]
pub trait PushService: Send + Sync {
    fn is_native(&self) -> bool;
    fn platform(&self) -> Option<PushPlatform>;
    async fn device_id(&self) -> Option<String>;
    /// `Ok(false)` when the user declined.
    async fn request_permission(&self) -> Result<bool, String>;
    /// Starts OS registration; the token arrives later through the returned channel.
    async fn register(&self) -> Result<TokenDelivery, String>;
}

/// Backend side of token registration.
#[async_trait]
pub trait PushTokenSink: Send + Sync {
    async fn register_token(&self, registration: &PushTokenRegistration) -> Result<(), String>;
    async fn unregister_token(&self, registration: &PushTokenRegistration) -> Result<(), String>;
}

#[async_trait]
impl PushTokenSink for PortalClient {
    async fn register_token(&self, registration: &PushTokenRegistration) -> Result<(), String> {
        self.register_push_token(registration)
            .await
            .map(|record: PushTokenRecord| debug!("Push token stored as record {}", record.id))
            .map_err(|err| err.to_string())
    }

    async fn unregister_token(&self, registration: &PushTokenRegistration) -> Result<(), String> {
        self.unregister_push_token(registration)
            .await
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}

/// One pending token request, filled from native token events. Also keeps the
/// device id the native side reported with its last token.
#[derive(Clone, Default)]
pub struct TokenSlot {
    pending: Arc<Mutex<Option<oneshot::Sender<Result<String, String>>>>>,
    device_id: Arc<Mutex<Option<String>>>,
}

impl TokenSlot {
    /// Replaces any earlier pending request.
    pub fn arm(&self) -> TokenDelivery {
        let (tx, rx) = oneshot::channel();
        *self.lock() = Some(tx);
        rx
    }

    /// Returns `false` when nobody is waiting for a token.
    pub fn deliver(&self, result: Result<String, String>) -> bool {
        match self.lock().take() {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }

    /// Blank ids are ignored; an earlier id is kept.
    pub fn remember_device(&self, device_id: Option<String>) {
        if let Some(id) = device_id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty()) {
            *self.device_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        }
    }

    pub fn device_id(&self) -> Option<String> {
        self.device_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<oneshot::Sender<Result<String, String>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct PushRegistrar {
    store: LocalStore,
    policy: RetryPolicy,
    token_timeout: Duration,
    state: Arc<Mutex<PushState>>,
}

impl PushRegistrar {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
            token_timeout: TOKEN_TIMEOUT,
            state: Arc::new(Mutex::new(PushState::Unrequested)),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_token_timeout(mut self, token_timeout: Duration) -> Self {
        self.token_timeout = token_timeout;
        self
    }

    pub fn state(&self) -> PushState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: PushState) -> PushState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        state
    }

    pub fn stored_token(&self) -> Option<String> {
        self.store.get(PUSH_TOKEN_KEY).filter(|token| !token.is_empty())
    }

    pub fn is_confirmed(&self) -> bool {
        self.store.get(PUSH_TOKEN_REGISTERED_KEY).as_deref() == Some("true")
    }

    /// Permission, token acquisition and backend registration. Run after every successful login.
    pub async fn request_and_register<P, S>(&self, service: &P, sink: &S) -> PushState
    where
        P: PushService + ?Sized,
        S: PushTokenSink + ?Sized,
    {
        let Some(platform) = native_platform(service) else {
            info!("Push registration skipped outside the native shell");
            return self.set_state(PushState::Skipped);
        };

        match service.request_permission().await {
            Ok(true) => {}
            Ok(false) => {
                info!("Push permission declined");
                return self.set_state(PushState::Denied);
            }
            Err(err) => {
                warn!("Push permission request failed: {}", err);
                return self.set_state(PushState::Failed);
            }
        }

        let delivery = match service.register().await {
            Ok(delivery) => delivery,
            Err(err) => {
                warn!("Push service registration failed: {}", err);
                return self.set_state(PushState::Failed);
            }
        };

        let token = match timeout(self.token_timeout, delivery).await {
            Ok(Ok(Ok(token))) if !token.trim().is_empty() => token,
            Ok(Ok(Ok(_))) => {
                warn!("Push service delivered an empty token");
                return self.set_state(PushState::Failed);
            }
            Ok(Ok(Err(err))) => {
                warn!("Push service reported a registration error: {}", err);
                return self.set_state(PushState::Failed);
            }
            Ok(Err(_)) => {
                warn!("Push token channel closed before a token arrived");
                return self.set_state(PushState::Failed);
            }
            Err(_) => {
                warn!("Push token did not arrive within {:?}", self.token_timeout);
                return self.set_state(PushState::Failed);
            }
        };

        self.remember_token(&token);
        self.set_state(PushState::TokenObtained);

        let registration = PushTokenRegistration {
            token,
            platform,
            device_id: service.device_id().await,
        };
        self.send(&registration, sink).await
    }

    /// Re-sends a stored token that the backend never confirmed. Does not prompt or fetch a new token.
    pub async fn resume_pending<P, S>(&self, service: &P, sink: &S) -> PushState
    where
        P: PushService + ?Sized,
        S: PushTokenSink + ?Sized,
    {
        let Some(platform) = native_platform(service) else {
            return self.set_state(PushState::Skipped);
        };
        let Some(token) = self.stored_token() else {
            return self.state();
        };
        if self.is_confirmed() {
            return self.set_state(PushState::Registered);
        }

        info!("Retrying backend registration of a stored push token");
        let registration = PushTokenRegistration {
            token,
            platform,
            device_id: service.device_id().await,
        };
        self.send(&registration, sink).await
    }

    /// Best-effort deactivation on logout; local token state is left as is.
    pub async fn unregister<P, S>(&self, service: &P, sink: &S)
    where
        P: PushService + ?Sized,
        S: PushTokenSink + ?Sized,
    {
        let (Some(platform), Some(token)) = (native_platform(service), self.stored_token()) else {
            return;
        };
        let registration = PushTokenRegistration {
            token,
            platform,
            device_id: service.device_id().await,
        };
        if let Err(err) = sink.unregister_token(&registration).await {
            warn!("Push token unregister failed: {}", err);
        }
    }

    fn remember_token(&self, token: &str) {
        if let Err(err) = self.store.set(PUSH_TOKEN_KEY, token) {
            warn!("Failed to persist push token: {}", err);
        }
        if let Err(err) = self.store.remove(PUSH_TOKEN_REGISTERED_KEY) {
            warn!("Failed to reset push registration flag: {}", err);
        }
    }

    async fn send<S>(&self, registration: &PushTokenRegistration, sink: &S) -> PushState
    where
        S: PushTokenSink + ?Sized,
    {
        let max_attempts = self.policy.max_attempts;
        let outcome = self
            .policy
            .run("push registration", |attempt| {
                info!("Sending push token to backend (attempt {}/{})", attempt, max_attempts);
                sink.register_token(registration)
            })
            .await;

        match outcome {
            Ok(()) => {
                info!("Push token registered on backend");
                if let Err(err) = self.store.set(PUSH_TOKEN_REGISTERED_KEY, "true") {
                    warn!("Failed to persist push registration flag: {}", err);
                }
                self.set_state(PushState::Registered)
            }
            Err(err) => {
                warn!("Push token registration gave up: {}", err);
                self.set_state(PushState::PendingRetry)
            }
        }
    }
}

fn native_platform<P: PushService + ?Sized>(service: &P) -> Option<PushPlatform> {
    if service.is_native() {
        service.platform()
    } else {
        None
    }
}
