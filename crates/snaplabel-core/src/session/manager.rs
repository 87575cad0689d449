use super::model::{SessionState, SigninData};
use super::store::CredentialStore;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// Owns the authentication state and its two-state lifecycle.
///
/// `SessionManager` is responsible for:
/// - Restoring state from the credential store at startup
/// - The Anonymous → Authenticated transition (`login`)
/// - The Authenticated → Anonymous transition (`logout`, idempotent)
/// - Notifying subscribers when the state actually changes
///
/// It is the single writer of both the in-memory state and the credential
/// store; every other component reads through its accessors.
#[derive(Clone)]
pub struct SessionManager {
    /// Current authentication state.
    state: Arc<RwLock<SessionState>>,
    /// Persistent storage backend for credentials.
    store: Arc<dyn CredentialStore>,
    /// Broadcast of state snapshots to subscribed consumers.
    notifier: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Creates a manager whose initial state comes from the store.
    ///
    /// A store that holds a complete credential set yields an Authenticated
    /// start; anything less yields Anonymous.
    pub async fn restore(store: Arc<dyn CredentialStore>) -> Self {
        let initial = store.load().await;
        tracing::debug!(
            authenticated = initial.is_authenticated,
            "restored session state from store"
        );
        let (notifier, _) = watch::channel(initial.clone());
        Self {
            state: Arc::new(RwLock::new(initial)),
            store,
            notifier,
        }
    }

    /// Transitions to Authenticated from a validated signin payload.
    ///
    /// Persists the credentials first, then swaps the in-memory state so the
    /// change is observable synchronously after this call returns. A payload
    /// missing any required field leaves the state untouched.
    pub async fn login(&self, payload: SigninData) -> Result<()> {
        payload.validate()?;

        let credentials = payload.credentials();
        self.store.save(&credentials, &payload.user).await?;

        let next = SessionState::authenticated(payload.user, credentials);
        let mut guard = self.state.write().await;
        *guard = next.clone();
        let _ = self.notifier.send(next);
        tracing::info!("session authenticated");
        Ok(())
    }

    /// Transitions to Anonymous, clearing both storage and memory.
    ///
    /// Calling this while already Anonymous is a no-op: no storage access,
    /// no notification. This is what collapses concurrent 401 responses into
    /// a single observable logout.
    pub async fn logout(&self) -> Result<()> {
        let mut guard = self.state.write().await;
        if !guard.is_authenticated {
            return Ok(());
        }

        self.store.clear().await?;
        *guard = SessionState::anonymous();
        let _ = self.notifier.send(guard.clone());
        tracing::info!("session cleared");
        Ok(())
    }

    /// Returns whether the session is currently Authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    /// The primary token, if authenticated.
    pub async fn primary_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .credentials
            .as_ref()
            .map(|c| c.primary_token.clone())
    }

    /// The identity-service access token, if authenticated.
    pub async fn service_access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .credentials
            .as_ref()
            .map(|c| c.service_access_token.clone())
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<super::model::UserProfile> {
        self.state.read().await.user.clone()
    }

    /// A point-in-time copy of the full state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Subscribes to state changes.
    ///
    /// The receiver holds the latest snapshot and is woken only on actual
    /// transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.notifier.subscribe()
    }
}
