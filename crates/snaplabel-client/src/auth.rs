//! Auth endpoints.
//!
//! Typed wrappers over the account lifecycle: signup, confirmation code,
//! signin, and the bearer-authorized profile fetch.

use crate::gateway::{ApiGateway, RequestOptions};
use serde::Serialize;
use snaplabel_core::error::{Result, SnapError};
use snaplabel_core::session::{SigninData, UserProfile};
use std::sync::Arc;

#[derive(Serialize)]
struct SignupRequest<'a> {
    username: &'a str,
    password: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct ConfirmRequest<'a> {
    username: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct SigninRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Acknowledgement from endpoints that answer with a message only.
#[derive(Debug, Clone)]
pub struct Ack {
    pub status_code: Option<u16>,
    pub message: String,
}

/// Client for the `/auth` and `/user` endpoint family.
#[derive(Clone)]
pub struct AuthApi {
    gateway: Arc<ApiGateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Registers a new account.
    pub async fn signup(&self, username: &str, password: &str, email: &str) -> Result<Ack> {
        if username.trim().is_empty() || password.is_empty() || email.trim().is_empty() {
            return Err(SnapError::validation(
                "Username, password and email are required",
            ));
        }

        let envelope = self
            .gateway
            .post_envelope(
                "/auth/signup",
                &SignupRequest {
                    username,
                    password,
                    email,
                },
            )
            .await?;
        Ok(Ack {
            status_code: envelope.status_code,
            message: envelope.message.unwrap_or_default(),
        })
    }

    /// Confirms a freshly registered account with the emailed code.
    pub async fn confirm_user(&self, username: &str, code: &str) -> Result<Ack> {
        if username.trim().is_empty() || code.trim().is_empty() {
            return Err(SnapError::validation("Username and code are required"));
        }

        let envelope = self
            .gateway
            .post_envelope("/auth/confirm-user", &ConfirmRequest { username, code })
            .await?;
        Ok(Ack {
            status_code: envelope.status_code,
            message: envelope.message.unwrap_or_default(),
        })
    }

    /// Exchanges credentials for the session payload.
    ///
    /// Returns the raw payload; callers that want the session established
    /// use [`AuthApi::login`] instead.
    pub async fn signin(&self, username: &str, password: &str) -> Result<SigninData> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SnapError::validation("Username and password are required"));
        }

        self.gateway
            .post_data("/auth/signin", &SigninRequest { username, password })
            .await
    }

    /// Signs in and transitions the session manager to Authenticated.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        let data = self.signin(username, password).await?;
        let user = data.user.clone();
        self.gateway.session().login(data).await?;
        Ok(user)
    }

    /// Fetches the signed-in user's profile.
    pub async fn profile(&self) -> Result<UserProfile> {
        self.gateway
            .get_data("/user/profile", RequestOptions::default())
            .await
    }
}
