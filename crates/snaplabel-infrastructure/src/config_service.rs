//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the client configuration
//! from the configuration file (~/.config/snaplabel/config.toml).

use crate::paths::SnapPaths;
use snaplabel_core::config::ClientConfig;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the client configuration.
///
/// Reads config.toml once and caches the result to avoid repeated file I/O.
/// A missing or malformed file falls back to the compiled defaults rather
/// than failing; the client must stay usable on a fresh machine.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<ClientConfig>>>,
    path: Option<PathBuf>,
}

impl ConfigService {
    /// Creates a new ConfigService over the platform config file.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: None,
        }
    }

    /// Creates a service over an explicit file path. Intended for tests.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: Some(path),
        }
    }

    /// Gets the client configuration, loading from file if not cached.
    pub fn get_config(&self) -> ClientConfig {
        // Check if already cached
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config().unwrap_or_else(|err| {
            tracing::debug!(error = %err, "using default client configuration");
            ClientConfig::default()
        });

        // Cache it
        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    fn config_path(&self) -> Result<PathBuf, String> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => SnapPaths::config_file().map_err(|e| e.to_string()),
        }
    }

    fn load_config(&self) -> Result<ClientConfig, String> {
        let path = self.config_path()?;
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config.toml: {}", e))
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaplabel_core::config::DEFAULT_BASE_URL;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::with_path(dir.path().join("config.toml"));
        let config = service.get_config();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_file_overrides_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "base_url = \"https://staging.example.com/api\"\nrequest_timeout_secs = 5\n",
        )
        .unwrap();

        let service = ConfigService::with_path(path);
        let config = service.get_config();
        assert_eq!(config.base_url, "https://staging.example.com/api");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = [not toml").unwrap();

        let service = ConfigService::with_path(path);
        assert_eq!(service.get_config(), ClientConfig::default());
    }

    #[test]
    fn test_invalidate_cache_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());
        assert_eq!(service.get_config(), ClientConfig::default());

        std::fs::write(&path, "base_url = \"https://other.example.com/api\"\n").unwrap();
        // Cached value survives until invalidated.
        assert_eq!(service.get_config(), ClientConfig::default());
        service.invalidate_cache();
        assert_eq!(
            service.get_config().base_url,
            "https://other.example.com/api"
        );
    }
}
