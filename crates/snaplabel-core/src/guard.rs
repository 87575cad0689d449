//! Route guard.
//!
//! A thin consumer of [`SessionManager`] that decides whether a view may be
//! shown. It holds no state of its own.

use crate::session::SessionManager;

/// The application's views, named by purpose rather than path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Register,
    ConfirmSignup,
    Dashboard,
    Upload,
    Profile,
}

impl Route {
    /// Whether the view requires an authenticated session.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Dashboard | Self::Upload | Self::Profile)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::ConfirmSignup => "/confirm-signup",
            Self::Dashboard => "/dashboard",
            Self::Upload => "/upload",
            Self::Profile => "/profile",
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
}

/// Allows or denies access to protected views.
pub struct RouteGuard {
    session: SessionManager,
}

impl RouteGuard {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    /// Decides whether `route` may be shown right now.
    ///
    /// Protected views require both the authenticated flag and a present
    /// primary token; a state that claims authentication without a token is
    /// treated as anonymous.
    pub async fn evaluate(&self, route: Route) -> RouteDecision {
        if !route.requires_auth() {
            return RouteDecision::Allow;
        }

        let state = self.session.snapshot().await;
        let has_token = state
            .credentials
            .as_ref()
            .map(|c| !c.primary_token.is_empty())
            .unwrap_or(false);
        if state.is_authenticated && has_token {
            RouteDecision::Allow
        } else {
            tracing::debug!(path = route.path(), "redirecting unauthenticated access");
            RouteDecision::RedirectToLogin
        }
    }
}
