//! Configuration for locating the history root
//!
//! The history root is resolved once, by whoever builds the store, and then
//! passed in explicitly. Nothing in this crate reads it from global state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{HistoryError, Result};

/// Directory name used under the user's configuration directory
pub const APP_DIR_NAME: &str = "confhist";

/// Directory name of the history root inside [`APP_DIR_NAME`]
pub const HISTORY_DIR_NAME: &str = "history";

/// Configuration structure for the history store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding one sub-directory per recorded snapshot
    pub root: PathBuf,
}

impl HistoryConfig {
    /// Create a configuration pointing at an explicit history root
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        HistoryConfig {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve the per-user history root, e.g. `~/.config/confhist/history` on Linux
    pub fn default_root() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            HistoryError::validation("could not determine the user configuration directory")
        })?;
        Ok(config_dir.join(APP_DIR_NAME).join(HISTORY_DIR_NAME))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(HistoryError::validation("history root cannot be empty"));
        }
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let root = Self::default_root().unwrap_or_else(|_| PathBuf::from(HISTORY_DIR_NAME));
        Self { root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_root() {
        let config = HistoryConfig::with_root("/tmp/history");
        assert_eq!(config.root, PathBuf::from("/tmp/history"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_root_layout() {
        if let Ok(root) = HistoryConfig::default_root() {
            assert!(root.ends_with(Path::new(APP_DIR_NAME).join(HISTORY_DIR_NAME)));
        }
    }

    #[test]
    fn test_default_config_ends_in_history_dir() {
        let config = HistoryConfig::default();
        assert!(config.root.ends_with(HISTORY_DIR_NAME));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_root() {
        let config = HistoryConfig::with_root("");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_config_serde() {
        let config = HistoryConfig::with_root("/var/lib/confhist");
        let json = serde_json::to_string(&config).unwrap();
        let back: HistoryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
