//! Path management for pawlist configuration and data files.
//!
//! ```text
//! ~/.config/pawlist/           # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/pawlist/      # Data directory
//! └── store/                   # File data store collections
//!     ├── pets.toml
//!     └── shelters.toml
//! ```

use std::path::PathBuf;

use pawlist_core::PawlistError;

const APP_DIR: &str = "pawlist";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
    /// Platform data directory could not be determined.
    DataDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
            PathError::DataDirNotFound => write!(f, "Cannot find data directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for PawlistError {
    fn from(err: PathError) -> Self {
        PawlistError::config(err.to_string())
    }
}

/// Platform paths for pawlist (XDG on Linux, the native locations elsewhere).
pub struct PawlistPaths;

impl PawlistPaths {
    /// Returns the configuration directory (e.g. `~/.config/pawlist/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the data directory (e.g. `~/.local/share/pawlist/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::DataDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Root directory of the file data store.
    pub fn store_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("store"))
    }
}
