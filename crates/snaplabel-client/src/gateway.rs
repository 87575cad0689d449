//! Request gateway.
//!
//! Uniform request dispatch with credential attachment and centralized 401
//! handling. Every credentialed call in the client goes through here; the
//! forced-logout-on-401 policy is global and no caller can opt out.

use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use snaplabel_core::config::ClientConfig;
use snaplabel_core::error::{Result, SnapError};
use snaplabel_core::session::{SessionManager, UnauthorizedObserver};
use snaplabel_infrastructure::{ConfigService, FileCredentialStore};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Header carrying the identity-service access token on signed-URL calls.
const SERVICE_TOKEN_HEADER: &str = "Cognito-Token";

/// Fallback message when a non-success response carries no usable body.
const GENERIC_FAILURE: &str = "Request failed";

/// The response envelope every backend endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Per-request dispatch options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Attach the identity-service access token alongside the bearer token.
    /// Only the signed-URL endpoint class sets this.
    pub with_service_token: bool,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn service_token() -> Self {
        Self {
            with_service_token: true,
            ..Self::default()
        }
    }

    pub fn with_query(query: Vec<(String, String)>) -> Self {
        Self {
            with_service_token: false,
            query,
        }
    }
}

/// Single dispatch point for credentialed backend requests.
///
/// Responsibilities:
/// - Reads the current primary token from the [`SessionManager`] (never from
///   storage) and attaches it as a bearer header
/// - Attaches the service access token on requests flagged for it
/// - Intercepts 401 responses: forces logout, notifies the registered
///   observer, and surfaces [`SnapError::Unauthorized`] to the caller
/// - Maps every other failure into the three-way classification the UI
///   relies on: server-supplied message, no response, or unexpected
#[derive(Clone)]
pub struct ApiGateway {
    client: Client,
    base_url: String,
    session: SessionManager,
    observer: Arc<RwLock<Option<Arc<dyn UnauthorizedObserver>>>>,
}

impl ApiGateway {
    pub fn new(config: &ClientConfig, session: SessionManager) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SnapError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            observer: Arc::new(RwLock::new(None)),
        })
    }

    /// Builds a gateway over the platform configuration and session file.
    ///
    /// Loads `config.toml` through [`ConfigService`] and restores the session
    /// from the file-backed credential store. Callers that already hold a
    /// `ConfigService` should use [`ApiGateway::with_config_service`] so the
    /// cached configuration is reused.
    pub async fn try_default() -> Result<Self> {
        Self::with_config_service(&ConfigService::new()).await
    }

    /// Builds a gateway from a caller-held [`ConfigService`].
    ///
    /// Reads through the service's cache, so repeated gateway construction
    /// does not re-read `config.toml`.
    pub async fn with_config_service(config: &ConfigService) -> Result<Self> {
        let config = config.get_config();
        let store = Arc::new(FileCredentialStore::new()?);
        let session = SessionManager::restore(store).await;
        Self::new(&config, session)
    }

    /// The session manager this gateway consults and, on 401, clears.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Registers the observer notified after a forced logout.
    pub fn set_unauthorized_observer(&self, observer: Arc<dyn UnauthorizedObserver>) {
        *self.observer.write().unwrap() = Some(observer);
    }

    /// GET returning the envelope's required `data` payload.
    pub(crate) async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let envelope = self.execute::<(), T>(Method::GET, path, None, options).await?;
        require_data(envelope)
    }

    /// POST returning the envelope's required `data` payload.
    pub(crate) async fn post_data<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let envelope = self
            .execute(Method::POST, path, Some(body), RequestOptions::default())
            .await?;
        require_data(envelope)
    }

    /// POST returning the raw envelope, for endpoints that answer with a
    /// message and no payload.
    pub(crate) async fn post_envelope<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope<serde_json::Value>> {
        self.execute(Method::POST, path, Some(body), RequestOptions::default())
            .await
    }

    async fn execute<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<ApiEnvelope<T>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "dispatching request");

        let mut builder = self.client.request(method, &url);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        // Token freshness: always read from the session manager, never from
        // storage.
        if let Some(token) = self.session.primary_token().await {
            builder = builder.bearer_auth(&token);
            if options.with_service_token {
                if let Some(access) = self.session.service_access_token().await {
                    builder = builder.header(SERVICE_TOKEN_HEADER, access);
                }
            }
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_builder() {
                SnapError::unexpected(format!("Failed to build request: {}", err))
            } else {
                tracing::warn!(%url, error = %err, "no response from server");
                SnapError::NoResponse
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized().await;
            return Err(SnapError::Unauthorized);
        }

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = extract_message(&body_text);
            tracing::warn!(%url, status = status.as_u16(), %message, "request rejected");
            return Err(SnapError::server(status.as_u16(), message));
        }

        response
            .json::<ApiEnvelope<T>>()
            .await
            .map_err(|err| SnapError::unexpected(format!("Failed to parse server response: {}", err)))
    }

    /// The global 401 policy: force logout, then tell the shell to redirect.
    ///
    /// Logout is idempotent, so concurrent 401s collapse into one observable
    /// transition; the observer still fires per response so the shell can
    /// settle on the login view.
    pub(crate) async fn handle_unauthorized(&self) {
        tracing::warn!("authorization failure, clearing session");
        if let Err(err) = self.session.logout().await {
            tracing::warn!(error = %err, "failed to clear session after 401");
        }
        let observer = self.observer.read().unwrap().clone();
        if let Some(observer) = observer {
            observer.on_unauthorized();
        }
    }
}

/// Extracts the server's human-readable message from a failure body.
///
/// Prefers `message`, then `error`, then the fixed generic fallback.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| {
            envelope
                .message
                .filter(|m| !m.is_empty())
                .or(envelope.error.filter(|e| !e.is_empty()))
        })
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

/// A 2xx answer without a `data` payload is a server-shape defect.
fn require_data<T>(envelope: ApiEnvelope<T>) -> Result<T> {
    envelope.data.ok_or_else(|| {
        SnapError::unexpected("Server response is missing its data payload")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaplabel_core::session::{
        CredentialStore, IdentityTokens, SessionCredentials, SessionState, SigninData,
        UserProfile,
    };
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryStore {
        stored: Mutex<Option<(SessionCredentials, UserProfile)>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                stored: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl CredentialStore for MemoryStore {
        async fn save(&self, credentials: &SessionCredentials, user: &UserProfile) -> Result<()> {
            *self.stored.lock().unwrap() = Some((credentials.clone(), user.clone()));
            Ok(())
        }

        async fn load(&self) -> SessionState {
            match self.stored.lock().unwrap().clone() {
                Some((credentials, user)) => SessionState::authenticated(user, credentials),
                None => SessionState::anonymous(),
            }
        }

        async fn clear(&self) -> Result<()> {
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    struct CountingObserver {
        notified: AtomicUsize,
    }

    impl UnauthorizedObserver for CountingObserver {
        fn on_unauthorized(&self) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn payload() -> SigninData {
        SigninData {
            token: "t1".to_string(),
            user: UserProfile {
                id: None,
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
            },
            identity_tokens: IdentityTokens {
                access_token: "a1".to_string(),
                refresh_token: "r1".to_string(),
            },
        }
    }

    async fn gateway() -> ApiGateway {
        let session = SessionManager::restore(Arc::new(MemoryStore::new())).await;
        ApiGateway::new(&ClientConfig::default(), session).unwrap()
    }

    #[test]
    fn test_extract_message_prefers_message_field() {
        let body = r#"{"statusCode": 400, "message": "Invalid code", "error": "Bad Request"}"#;
        assert_eq!(extract_message(body), "Invalid code");
    }

    #[test]
    fn test_extract_message_falls_back_to_error_field() {
        let body = r#"{"statusCode": 500, "error": "Internal failure"}"#;
        assert_eq!(extract_message(body), "Internal failure");
    }

    #[test]
    fn test_extract_message_generic_on_junk() {
        assert_eq!(extract_message("<html>panic</html>"), GENERIC_FAILURE);
        assert_eq!(extract_message(""), GENERIC_FAILURE);
        assert_eq!(extract_message("{}"), GENERIC_FAILURE);
    }

    #[test]
    fn test_envelope_decodes_camel_case() {
        let body = r#"{"statusCode": 200, "message": "ok", "data": {"signedUrl": "u"}}"#;
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.status_code, Some(200));
        assert!(envelope.data.is_some());
    }

    #[test]
    fn test_require_data_rejects_empty_payload() {
        let envelope: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"statusCode": 200, "message": "ok"}"#).unwrap();
        assert!(require_data(envelope).is_err());
    }

    #[tokio::test]
    async fn test_unauthorized_forces_single_logout() {
        let gateway = gateway().await;
        gateway.session().login(payload()).await.unwrap();

        let observer = Arc::new(CountingObserver {
            notified: AtomicUsize::new(0),
        });
        gateway.set_unauthorized_observer(observer.clone());

        let mut receiver = gateway.session().subscribe();
        receiver.mark_unchanged();

        // Two responses race in with 401; state transitions once.
        gateway.handle_unauthorized().await;
        gateway.handle_unauthorized().await;

        assert!(!gateway.session().is_authenticated().await);
        assert!(receiver.has_changed().unwrap());
        receiver.mark_unchanged();
        assert!(!receiver.has_changed().unwrap());
        // The shell is told to redirect on each response.
        assert_eq!(observer.notified.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_config_service_reuses_cached_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = \"https://staging.example.com/api\"\n").unwrap();

        let service = ConfigService::with_path(path.clone());
        let gateway = ApiGateway::with_config_service(&service).await.unwrap();
        assert_eq!(gateway.base_url, "https://staging.example.com/api");

        // The held service answers from its cache; a second gateway does not
        // re-read the (now removed) file.
        std::fs::remove_file(&path).unwrap();
        let gateway = ApiGateway::with_config_service(&service).await.unwrap();
        assert_eq!(gateway.base_url, "https://staging.example.com/api");
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_trimmed() {
        let session = SessionManager::restore(Arc::new(MemoryStore::new())).await;
        let config = ClientConfig {
            base_url: "https://api.example.com/api/".to_string(),
            ..ClientConfig::default()
        };
        let gateway = ApiGateway::new(&config, session).unwrap();
        assert_eq!(gateway.base_url, "https://api.example.com/api");
    }
}
