use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use secrecy::SecretString;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::error::{AuthError, Result};
use super::provider::ConsentProvider;
use super::store::TokenStore;
use super::token::{AuthToken, TokenPolicy};

type PendingConsent = Shared<BoxFuture<'static, Result<AuthToken>>>;

enum State {
    Unauthenticated,
    /// One consent flow is running; every caller awaits the same future.
    Authenticating(PendingConsent),
    Authenticated(AuthToken),
}

/// Externally visible token state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthStatus {
    Unauthenticated,
    Authenticating,
    Authenticated { expires_at: DateTime<Utc> },
    /// Inside the refresh lead window.
    Expiring { expires_at: DateTime<Utc> },
}

struct RefreshTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    provider: Arc<dyn ConsentProvider>,
    store: Arc<dyn TokenStore>,
    policy: TokenPolicy,
    state: Mutex<State>,
    timer: Mutex<Option<RefreshTimer>>,
    generation: AtomicU64,
    /// Bumped on every sign-out while holding the state lock. Consent and
    /// refresh results from an earlier epoch are discarded.
    epoch: AtomicU64,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn timer(&self) -> MutexGuard<'_, Option<RefreshTimer>> {
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, token: &AuthToken) {
        if let Err(e) = self.store.save(token) {
            log::warn!("Failed to persist token: {}", e);
        }
    }

    fn forget_persisted(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear persisted token: {}", e);
        }
    }

    /// The persisted token, if one exists and is still valid. Stale or
    /// unreadable entries are removed.
    fn load_persisted(&self) -> Option<AuthToken> {
        match self.store.load() {
            Ok(Some(token)) if token.is_valid_at(Utc::now(), self.policy.expiry_margin) => {
                Some(token)
            }
            Ok(Some(_)) => {
                log::debug!("Persisted token has expired");
                self.forget_persisted();
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Discarding unreadable persisted token: {}", e);
                self.forget_persisted();
                None
            }
        }
    }
}

/// Single source of truth for the API bearer token.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

impl TokenManager {
    pub fn new(
        provider: Arc<dyn ConsentProvider>,
        store: Arc<dyn TokenStore>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                store,
                policy,
                state: Mutex::new(State::Unauthenticated),
                timer: Mutex::new(None),
                generation: AtomicU64::new(0),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a valid access token, prompting for consent only when neither
    /// the in-memory nor the persisted token is usable. Concurrent callers
    /// share a single consent flow.
    pub async fn get_valid_token(&self) -> Result<SecretString> {
        let pending = {
            let mut state = self.inner.state();
            if let State::Authenticated(token) = &*state {
                if token.is_valid_at(Utc::now(), self.inner.policy.expiry_margin) {
                    return Ok(token.access_token().clone());
                }
            }

            if let State::Authenticating(pending) = &*state {
                pending.clone()
            } else if let Some(token) = self.inner.load_persisted() {
                log::debug!("Using persisted token (expires {})", token.expires_at());
                *state = State::Authenticated(token.clone());
                drop(state);
                self.schedule_refresh(&token);
                return Ok(token.access_token().clone());
            } else {
                let pending = self.start_consent();
                *state = State::Authenticating(pending.clone());
                pending
            }
        };

        pending.await.map(|token| token.access_token().clone())
    }

    pub fn status(&self) -> AuthStatus {
        match &*self.inner.state() {
            State::Unauthenticated => AuthStatus::Unauthenticated,
            State::Authenticating(_) => AuthStatus::Authenticating,
            State::Authenticated(token) => {
                let expires_at = token.expires_at();
                if Utc::now() >= token.refresh_due_at(self.inner.policy.refresh_lead) {
                    AuthStatus::Expiring { expires_at }
                } else {
                    AuthStatus::Authenticated { expires_at }
                }
            }
        }
    }

    /// Drops the token everywhere and revokes it with the provider.
    /// A consent or refresh still in flight is discarded when it completes.
    /// Revocation failures are logged only.
    pub async fn sign_out(&self) -> Result<()> {
        let previous = {
            let mut state = self.inner.state();
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            std::mem::replace(&mut *state, State::Unauthenticated)
        };
        self.cancel_refresh();
        self.inner.store.clear()?;

        if let State::Authenticated(token) = previous {
            if let Err(e) = self.inner.provider.revoke(&token).await {
                log::warn!("Token revocation failed: {}", e);
            }
        }
        log::info!("Signed out");
        Ok(())
    }

    fn start_consent(&self) -> PendingConsent {
        let manager = self.clone();
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        async move {
            log::info!("Starting interactive consent");
            let inner = &manager.inner;
            let outcome = inner.provider.interactive().await;

            let mut state = inner.state();
            if inner.epoch.load(Ordering::SeqCst) != epoch {
                log::info!("Signed out during consent, discarding the result");
                return Err(AuthError::Cancelled("signed out during consent".to_string()));
            }
            match outcome {
                Ok(grant) => {
                    let token = AuthToken::from_grant(grant, Utc::now(), &inner.policy);
                    inner.persist(&token);
                    *state = State::Authenticated(token.clone());
                    drop(state);
                    manager.schedule_refresh(&token);
                    Ok(token)
                }
                Err(e) => {
                    log::warn!("Consent failed: {}", e);
                    *state = State::Unauthenticated;
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Arms the silent refresh for `token`, replacing any earlier timer.
    fn schedule_refresh(&self, token: &AuthToken) {
        let delay = (token.refresh_due_at(self.inner.policy.refresh_lead) - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            {
                let mut timer = inner.timer();
                let current = matches!(timer.as_ref(), Some(t) if t.generation == generation);
                if !current {
                    return;
                }
                // detach our own handle so rescheduling cannot abort us
                timer.take();
            }
            TokenManager { inner }.silent_refresh().await;
        });

        log::debug!("Silent refresh scheduled in {:?}", delay);
        if let Some(previous) = self.inner.timer().replace(RefreshTimer { generation, handle }) {
            previous.handle.abort();
        }
    }

    fn cancel_refresh(&self) {
        if let Some(timer) = self.inner.timer().take() {
            timer.handle.abort();
        }
    }

    async fn silent_refresh(&self) {
        let (current, epoch) = {
            let state = self.inner.state();
            match &*state {
                State::Authenticated(token) => {
                    (token.clone(), self.inner.epoch.load(Ordering::SeqCst))
                }
                _ => return,
            }
        };

        let outcome = self.inner.provider.refresh(&current).await;

        let mut state = self.inner.state();
        let still_signed_in = self.inner.epoch.load(Ordering::SeqCst) == epoch
            && matches!(*state, State::Authenticated(_));
        if !still_signed_in {
            log::debug!("Discarding silent refresh result after sign-out");
            return;
        }
        match outcome {
            Ok(grant) => {
                let token = AuthToken::from_grant(grant, Utc::now(), &self.inner.policy)
                    .with_refresh_fallback(current.refresh_token());
                self.inner.persist(&token);
                *state = State::Authenticated(token.clone());
                drop(state);
                log::info!("Token refreshed silently (expires {})", token.expires_at());
                self.schedule_refresh(&token);
            }
            Err(e) => {
                log::warn!("Silent refresh failed, interactive consent will be required: {}", e);
                *state = State::Unauthenticated;
                self.inner.forget_persisted();
            }
        }
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("status", &self.status())
            .finish()
    }
}
