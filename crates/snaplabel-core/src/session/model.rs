//! Session domain models.
//!
//! This module contains the authentication state entities that the
//! `SessionManager` operates on, plus the signin payload as the backend
//! sends it on the wire.

use crate::error::{Result, SnapError};
use serde::{Deserialize, Serialize};

/// The session credentials issued by the backend.
///
/// All three tokens are opaque strings. Either all three are present and
/// consistent, or the session is anonymous; partial sets never occur in a
/// constructed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    /// The application's own session credential.
    pub primary_token: String,
    /// Access token issued by the third-party identity service. Required
    /// only by the signed-URL endpoint class.
    pub service_access_token: String,
    /// Refresh token issued by the third-party identity service.
    pub service_refresh_token: String,
}

/// The signed-in user, replaced wholesale on login and cleared on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend-assigned identifier. Some responses omit it.
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    pub email: String,
}

/// The complete authentication state owned by the `SessionManager`.
///
/// Constructed at application start from the credential store and mutated
/// only through `login`/`logout`. UI code never writes to it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<UserProfile>,
    pub credentials: Option<SessionCredentials>,
}

impl SessionState {
    /// The state of a browser-fresh or logged-out client.
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            credentials: None,
        }
    }

    pub fn authenticated(user: UserProfile, credentials: SessionCredentials) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            credentials: Some(credentials),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Token pair issued by the identity service, nested inside the signin
/// response under the `cognitoTokens` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// The `data` payload of a successful `/auth/signin` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigninData {
    /// The application's primary session token.
    pub token: String,
    pub user: UserProfile,
    #[serde(rename = "cognitoTokens")]
    pub identity_tokens: IdentityTokens,
}

impl SigninData {
    /// Checks that every required credential field is present.
    ///
    /// A payload missing any of the three tokens, or naming no user, must not
    /// transition the session to Authenticated.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(SnapError::validation("Signin response is missing a token"));
        }
        if self.identity_tokens.access_token.trim().is_empty() {
            return Err(SnapError::validation(
                "Signin response is missing an access token",
            ));
        }
        if self.identity_tokens.refresh_token.trim().is_empty() {
            return Err(SnapError::validation(
                "Signin response is missing a refresh token",
            ));
        }
        if self.user.username.trim().is_empty() {
            return Err(SnapError::validation("Signin response names no user"));
        }
        Ok(())
    }

    /// Splits the payload into its credential set.
    pub fn credentials(&self) -> SessionCredentials {
        SessionCredentials {
            primary_token: self.token.clone(),
            service_access_token: self.identity_tokens.access_token.clone(),
            service_refresh_token: self.identity_tokens.refresh_token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_signin_data_decodes_wire_shape() {
        let json = r#"{
            "token": "t1",
            "user": {"username": "alice", "email": "a@x.com"},
            "cognitoTokens": {"accessToken": "a1", "refreshToken": "r1"}
        }"#;
        let data: SigninData = serde_json::from_str(json).unwrap();
        assert_eq!(data, payload());
    }

    #[test]
    fn test_validate_rejects_missing_tokens() {
        let mut missing_token = payload();
        missing_token.token = String::new();
        assert!(missing_token.validate().unwrap_err().is_validation());

        let mut missing_access = payload();
        missing_access.identity_tokens.access_token = String::new();
        assert!(missing_access.validate().unwrap_err().is_validation());

        let mut missing_refresh = payload();
        missing_refresh.identity_tokens.refresh_token = "  ".to_string();
        assert!(missing_refresh.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_credentials_split() {
        let creds = payload().credentials();
        assert_eq!(creds.primary_token, "t1");
        assert_eq!(creds.service_access_token, "a1");
        assert_eq!(creds.service_refresh_token, "r1");
    }
}
