//! Path management for the waterfall data directory
//!
//! ## Path Resolution Order
//!
//! 1. `WATERFALL_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/envelope-waterfall` or `~/.config/envelope-waterfall`
//! 3. Windows: `%APPDATA%\envelope-waterfall`

use std::path::PathBuf;

use crate::error::WaterfallError;

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "WATERFALL_DATA_DIR";

const APP_DIR: &str = "envelope-waterfall";

/// Manages all paths used by the waterfall tool
#[derive(Debug, Clone)]
pub struct WaterfallPaths {
    base_dir: PathBuf,
}

impl WaterfallPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if neither the override nor a home directory is
    /// available.
    pub fn new() -> Result<Self, WaterfallError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to rules.json (rules and category templates)
    pub fn rules_file(&self) -> PathBuf {
        self.data_dir().join("rules.json")
    }

    /// Get the path to catalog.json (accounts, categories, goals, charges)
    pub fn catalog_file(&self) -> PathBuf {
        self.data_dir().join("catalog.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), WaterfallError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| WaterfallError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| WaterfallError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if the data directory has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, WaterfallError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").map_err(|_| {
                WaterfallError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join(APP_DIR))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, WaterfallError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| WaterfallError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join(APP_DIR))
}
