//! Configuration service.
//!
//! Loads [`PawlistConfig`] from `~/.config/pawlist/config.toml` (or an explicit
//! path) and caches it until [`ConfigService::invalidate_cache`] is called.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use pawlist_core::config::PawlistConfig;
use pawlist_core::error::Result;

use crate::paths::PawlistPaths;

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<PawlistConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the platform config file.
    ///
    /// The file is read lazily on first access.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(PawlistPaths::config_file()?))
    }

    /// Creates a service reading `path` (for testing or custom layouts).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file yields the defaults. A file that fails to parse is an
    /// error and nothing is cached.
    pub fn get_config(&self) -> Result<PawlistConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn load_config(&self) -> Result<PawlistConfig> {
        if !self.path.exists() {
            tracing::warn!(path = %self.path.display(), "config file not found, using defaults");
            return Ok(PawlistConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config = PawlistConfig::from_toml_str(&content).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "failed to parse config");
            e
        })?;

        tracing::debug!(path = %self.path.display(), "config loaded");
        Ok(config)
    }
}
