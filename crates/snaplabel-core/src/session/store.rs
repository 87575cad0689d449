//! Credential store trait.
//!
//! Defines the interface for persisting session credentials across
//! application restarts.

use super::model::{SessionCredentials, SessionState, UserProfile};
use crate::error::Result;

/// Durable persistence for session credentials.
///
/// The `SessionManager` is the sole caller; no other component touches the
/// underlying storage.
///
/// # Security Note
///
/// Implementations should ensure that:
/// - The backing file has appropriate permissions (e.g., 600 on Unix)
/// - Tokens are never logged or exposed in error messages
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists the full credential set and user record.
    ///
    /// The write is atomic from the reader's perspective: a later `load`
    /// observes either the complete previous state or the complete new one.
    async fn save(&self, credentials: &SessionCredentials, user: &UserProfile) -> Result<()>;

    /// Reconstructs the session state from storage.
    ///
    /// Returns the anonymous state when any stored field is absent,
    /// malformed, or storage access fails. Never returns an error.
    async fn load(&self) -> SessionState;

    /// Removes all persisted credentials. Idempotent.
    async fn clear(&self) -> Result<()>;
}
