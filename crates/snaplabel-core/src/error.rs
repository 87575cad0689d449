//! Error types for the snaplabel client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire snaplabel client.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Every variant flattens to a
/// single displayable message via [`SnapError::user_message`], which is the
/// only shape the UI layer ever sees.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SnapError {
    /// Local validation error (bad file type, missing form field).
    /// Detected before any network call is made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request was sent but no response was received from the server.
    #[error("No response from server")]
    NoResponse,

    /// The server answered with a non-success status and (possibly) a
    /// structured message in the response body.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The server rejected the request credentials (401). The request
    /// gateway converts this into a forced logout before it propagates.
    #[error("Unauthorized")]
    Unauthorized,

    /// Local storage error (credential file read/write).
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected local error (should not happen in normal operation)
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl SnapError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an Unauthorized error
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Check if this is a NoResponse error
    pub fn is_no_response(&self) -> bool {
        matches!(self, Self::NoResponse)
    }

    /// Check if this is a Server error
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// The single display string the UI layer shows for this failure.
    ///
    /// Server-supplied messages are surfaced verbatim; everything else falls
    /// back to fixed, generically worded text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::NoResponse => "No response from server".to_string(),
            Self::Server { message, .. } => message.clone(),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Storage { message } => message.clone(),
            Self::Serialization { message, .. } => message.clone(),
            Self::Config(message) => message.clone(),
            Self::Unexpected(message) => message.clone(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SnapError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SnapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SnapError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, SnapError>`.
pub type Result<T> = std::result::Result<T, SnapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_surfaced_verbatim() {
        let err = SnapError::server(422, "Username already exists");
        assert_eq!(err.user_message(), "Username already exists");
        assert!(err.is_server());
    }

    #[test]
    fn test_no_response_wording_is_fixed() {
        assert_eq!(
            SnapError::NoResponse.user_message(),
            "No response from server"
        );
    }

    #[test]
    fn test_io_error_converts_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SnapError = io.into();
        assert!(matches!(err, SnapError::Storage { .. }));
    }
}
