//! Unified path management for snaplabel configuration files.
//!
//! All client configuration and the persisted session live under the
//! platform config directory so that behavior is consistent across Linux,
//! macOS and Windows.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for snaplabel.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/snaplabel/         # Config directory (XDG on Linux/macOS)
/// ├── config.toml              # Client configuration (base URL, timeout)
/// └── session.json             # Persisted session credentials
/// ```
pub struct SnapPaths;

impl SnapPaths {
    /// Returns the snaplabel configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/snaplabel/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("snaplabel"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the persisted session file.
    ///
    /// # Security Note
    ///
    /// The file holds session tokens; [`crate::FileCredentialStore`] writes
    /// it with 600 permissions on Unix.
    pub fn session_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("session.json"))
    }
}
