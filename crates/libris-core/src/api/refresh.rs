//! Single-flight coordination of access-token refresh.
//!
//! One `RefreshCoordinator` belongs to one `ApiClient` and its clones. The
//! first request that needs a new access token becomes the leader and calls
//! the refresh endpoint; every request that fails while that call is in
//! flight waits on a oneshot channel and receives the leader's outcome.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::auth::CredentialStore;

/// Why a refresh cycle did not produce a new access token.
///
/// Cloneable so the same failure can be handed to every queued request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    #[error("no refresh token stored")]
    MissingRefreshToken,

    #[error("refresh token rejected with status {0}")]
    Rejected(u16),

    #[error("refresh request failed: {0}")]
    Network(String),

    #[error("refresh response could not be read: {0}")]
    InvalidResponse(String),

    #[error("could not persist refreshed tokens: {0}")]
    Storage(String),

    #[error("refresh was abandoned before it completed")]
    Abandoned,

    #[error("session was cleared while the request was in flight")]
    SessionCleared,
}

/// Tokens minted by the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// `None` when the server rotates only the access token.
    pub refresh_token: Option<String>,
}

/// Invoked once per irrecoverable session loss, after credentials are cleared.
pub type SessionExpiredHook = Arc<dyn Fn(&RefreshFailure) + Send + Sync>;

type Waiter = oneshot::Sender<Result<String, RefreshFailure>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// What prompted a refresh.
#[derive(Clone, Copy)]
enum Trigger<'a> {
    /// The caller asked for a new token outright.
    Explicit,
    /// A request sent with this access token was rejected.
    Rejected(Option<&'a str>),
}

enum Turn {
    Lead,
    Wait(oneshot::Receiver<Result<String, RefreshFailure>>),
    /// A refresh that finished after the request was sent already decided the outcome.
    Settled(Result<String, RefreshFailure>),
}

pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    credentials: CredentialStore,
    on_expired: Option<SessionExpiredHook>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.is_refreshing())
            .field("pending", &self.pending())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(credentials: CredentialStore, on_expired: Option<SessionExpiredHook>) -> Self {
        Self {
            state: Mutex::new(RefreshState::default()),
            credentials,
            on_expired,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of requests currently queued behind the in-flight refresh.
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Obtain a fresh access token, running `refresh` only if no refresh is in flight.
    ///
    /// The leader/waiter decision is made here, when the unauthorized
    /// response is processed, not when the original request started.
    pub async fn authorize<F, Fut>(self: &Arc<Self>, refresh: F) -> Result<String, RefreshFailure>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<RefreshedTokens, RefreshFailure>> + Send + 'static,
    {
        let turn = self.take_turn(Trigger::Explicit);
        self.follow(turn, refresh).await
    }

    /// Like `authorize`, for a request that was rejected after being sent
    /// with `sent_with`.
    ///
    /// When a refresh has completed since then, its result is reused: the
    /// rotated token if it succeeded, `SessionCleared` if it ended the
    /// session. The check runs under the same lock that picks the leader.
    pub async fn authorize_rejected<F, Fut>(
        self: &Arc<Self>,
        sent_with: Option<&str>,
        refresh: F,
    ) -> Result<String, RefreshFailure>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<RefreshedTokens, RefreshFailure>> + Send + 'static,
    {
        let turn = self.take_turn(Trigger::Rejected(sent_with));
        self.follow(turn, refresh).await
    }

    fn take_turn(&self, trigger: Trigger<'_>) -> Turn {
        let mut state = self.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            debug!(queued = state.waiters.len(), "Refresh in flight, queueing request");
            return Turn::Wait(rx);
        }

        if let Trigger::Rejected(sent_with) = trigger {
            match self.credentials.access_token() {
                // Another request already ended the session; do not expire it twice.
                Ok(None) if sent_with.is_some() => {
                    return Turn::Settled(Err(RefreshFailure::SessionCleared));
                }
                Ok(Some(current)) if Some(current.as_str()) != sent_with => {
                    debug!("Access token rotated since request was sent, skipping refresh");
                    return Turn::Settled(Ok(current));
                }
                Ok(_) => {}
                Err(e) => return Turn::Settled(Err(RefreshFailure::Storage(format!("{:#}", e)))),
            }
        }

        state.in_flight = true;
        Turn::Lead
    }

    async fn follow<F, Fut>(self: &Arc<Self>, turn: Turn, refresh: F) -> Result<String, RefreshFailure>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<RefreshedTokens, RefreshFailure>> + Send + 'static,
    {
        match turn {
            Turn::Settled(outcome) => outcome,
            Turn::Wait(rx) => rx.await.unwrap_or(Err(RefreshFailure::Abandoned)),
            Turn::Lead => self.lead(refresh).await,
        }
    }

    /// Run the refresh call on its own task.
    ///
    /// The server may rotate the refresh token as soon as it receives the
    /// call, so its answer is stored and shared with waiters even when the
    /// leading request is dropped before the call returns.
    async fn lead<F, Fut>(self: &Arc<Self>, refresh: F) -> Result<String, RefreshFailure>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<RefreshedTokens, RefreshFailure>> + Send + 'static,
    {
        let flight = Flight {
            coordinator: Arc::clone(self),
            landed: false,
        };
        let refresh_token = match self.credentials.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => return flight.land(Err(RefreshFailure::MissingRefreshToken)),
            Err(e) => return flight.land(Err(RefreshFailure::Storage(format!("{:#}", e)))),
        };

        info!("Access token rejected, refreshing session");
        let call = refresh(refresh_token);
        let task = tokio::spawn(async move {
            let outcome = match call.await {
                Ok(tokens) => flight.coordinator.store(tokens),
                Err(e) => Err(e),
            };
            flight.land(outcome)
        });

        task.await.unwrap_or_else(|e| {
            warn!(error = %e, "Refresh task did not complete");
            Err(RefreshFailure::Abandoned)
        })
    }

    fn store(&self, tokens: RefreshedTokens) -> Result<String, RefreshFailure> {
        self.credentials
            .set_tokens(&tokens.access_token, tokens.refresh_token.as_deref())
            .map_err(|e| RefreshFailure::Storage(format!("{:#}", e)))?;
        debug!(rotated_refresh = tokens.refresh_token.is_some(), "Session refreshed");
        Ok(tokens.access_token)
    }

    /// Clear every credential and notify the hook.
    pub fn expire_session(&self, reason: &RefreshFailure) {
        warn!(%reason, "Session expired, clearing credentials");
        if let Err(e) = self.credentials.clear_all() {
            warn!(error = %e, "Failed to clear credentials after session expiry");
        }
        if let Some(hook) = &self.on_expired {
            hook(reason);
        }
    }

    fn finish(&self, outcome: &Result<String, RefreshFailure>) {
        if let Err(reason) = outcome {
            self.expire_session(reason);
        }
        self.release(outcome);
    }

    /// Clear the in-flight flag and hand the outcome to every queued request.
    fn release(&self, outcome: &Result<String, RefreshFailure>) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        if !waiters.is_empty() {
            debug!(count = waiters.len(), ok = outcome.is_ok(), "Releasing queued requests");
        }
        for waiter in waiters {
            // The receiving request may have been dropped meanwhile.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Hold on the in-flight flag. Dropping it without landing (the refresh
/// task panicked or the runtime shut down) releases waiters with `Abandoned`.
struct Flight {
    coordinator: Arc<RefreshCoordinator>,
    landed: bool,
}

impl Flight {
    fn land(mut self, outcome: Result<String, RefreshFailure>) -> Result<String, RefreshFailure> {
        self.landed = true;
        self.coordinator.finish(&outcome);
        outcome
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        if !self.landed {
            warn!("Refresh cancelled before completion, failing queued requests");
            self.coordinator.release(&Err(RefreshFailure::Abandoned));
        }
    }
}
