//! File-backed credential store implementation.
//!
//! Persists the session as a single JSON document so the four credential
//! fields travel together; a reader can never observe a partial credential
//! set.

use crate::paths::SnapPaths;
use serde::{Deserialize, Serialize};
use snaplabel_core::error::{Result, SnapError};
use snaplabel_core::session::{CredentialStore, SessionCredentials, SessionState, UserProfile};
use std::path::{Path, PathBuf};

/// The persisted session document.
///
/// Field names match the original browser-storage keys so a serialized
/// session stays readable next to backend payloads.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: String,
    access_token: String,
    refresh_token: String,
    user: UserProfile,
    saved_at: String,
}

/// Credential store that keeps the session in `session.json`.
///
/// Saves go through a temporary file in the same directory followed by a
/// rename, so `load` observes either the complete previous session or the
/// complete new one. Any defect in the stored document, including a missing
/// file, loads as the anonymous state.
#[derive(Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store over the platform session file.
    pub fn new() -> Result<Self> {
        let path = SnapPaths::session_file()
            .map_err(|e| SnapError::config(format!("Failed to resolve session path: {}", e)))?;
        Ok(Self { path })
    }

    /// Creates a store rooted at `base_dir` instead of the platform config
    /// directory. Intended for tests.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            path: base_dir.join("session.json"),
        }
    }

    async fn read_stored(&self) -> Option<StoredSession> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(error = %err, "failed to read session file");
                }
                return None;
            }
        };

        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Some(stored),
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed session file");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, credentials: &SessionCredentials, user: &UserProfile) -> Result<()> {
        let stored = StoredSession {
            token: credentials.primary_token.clone(),
            access_token: credentials.service_access_token.clone(),
            refresh_token: credentials.service_refresh_token.clone(),
            user: user.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };
        let document = serde_json::to_string_pretty(&stored)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write the sibling temp file, then rename over the target so a
        // concurrent load never sees a torn document.
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, document).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, permissions).await?;
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;
        tracing::debug!("session persisted");
        Ok(())
    }

    async fn load(&self) -> SessionState {
        let Some(stored) = self.read_stored().await else {
            return SessionState::anonymous();
        };

        // All-or-nothing: a document missing any credential field is not a
        // session.
        if stored.token.is_empty()
            || stored.access_token.is_empty()
            || stored.refresh_token.is_empty()
            || stored.user.username.is_empty()
        {
            tracing::warn!("discarding partial credential set");
            return SessionState::anonymous();
        }

        SessionState::authenticated(
            stored.user,
            SessionCredentials {
                primary_token: stored.token,
                service_access_token: stored.access_token,
                service_refresh_token: stored.refresh_token,
            },
        )
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SessionCredentials {
        SessionCredentials {
            primary_token: "t1".to_string(),
            service_access_token: "a1".to_string(),
            service_refresh_token: "r1".to_string(),
        }
    }

    fn user() -> UserProfile {
        UserProfile {
            id: Some("u-1".to_string()),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::with_base_dir(dir.path());

        store.save(&credentials(), &user()).await.unwrap();
        let state = store.load().await;

        assert!(state.is_authenticated);
        assert_eq!(state.user.unwrap().username, "alice");
        assert_eq!(state.credentials.unwrap(), credentials());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::with_base_dir(dir.path());
        assert_eq!(store.load().await, SessionState::anonymous());
    }

    #[tokio::test]
    async fn test_load_malformed_json_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::with_base_dir(dir.path());
        std::fs::write(dir.path().join("session.json"), "{not json").unwrap();

        assert_eq!(store.load().await, SessionState::anonymous());
    }

    #[tokio::test]
    async fn test_load_partial_document_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::with_base_dir(dir.path());
        // Primary token present but service tokens missing entirely.
        std::fs::write(
            dir.path().join("session.json"),
            r#"{"token": "t1", "user": {"username": "alice", "email": "a@x.com"}}"#,
        )
        .unwrap();

        assert_eq!(store.load().await, SessionState::anonymous());
    }

    #[tokio::test]
    async fn test_load_empty_token_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::with_base_dir(dir.path());
        std::fs::write(
            dir.path().join("session.json"),
            r#"{
                "token": "",
                "accessToken": "a1",
                "refreshToken": "r1",
                "user": {"username": "alice", "email": "a@x.com"},
                "savedAt": "2026-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(store.load().await, SessionState::anonymous());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::with_base_dir(dir.path());

        store.save(&credentials(), &user()).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.load().await, SessionState::anonymous());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::with_base_dir(dir.path());
        store.save(&credentials(), &user()).await.unwrap();

        let mode = std::fs::metadata(dir.path().join("session.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
