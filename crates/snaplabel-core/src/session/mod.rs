//! Session domain module.
//!
//! This module contains the authentication state machine and its
//! collaborators.
//!
//! # Module Structure
//!
//! - `model`: Session domain models (`SessionState`, `SessionCredentials`,
//!   `UserProfile`) and the signin wire payload (`SigninData`)
//! - `store`: `CredentialStore` trait for durable credential persistence
//! - `manager`: The Anonymous/Authenticated state machine (`SessionManager`)

mod manager;
mod model;
mod store;

// Re-export public API
pub use manager::SessionManager;
pub use model::{IdentityTokens, SessionCredentials, SessionState, SigninData, UserProfile};
pub use store::CredentialStore;

/// Observer notified when the request gateway intercepts a 401.
///
/// The embedding UI shell registers an implementation to redirect the user to
/// the login view. The forced logout itself is handled by the gateway before
/// the observer fires, so implementations only deal with navigation.
pub trait UnauthorizedObserver: Send + Sync {
    fn on_unauthorized(&self);
}
