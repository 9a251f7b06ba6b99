//! Run configuration
//!
//! [`CheckerConfig`] collects every knob of a run. It can be built in code,
//! through [`FolderCheckerBuilder`](crate::FolderCheckerBuilder), or loaded
//! from a JSON file where every field is optional:
//!
//! ```json
//! {
//!   "sidecar_name": "fileinfo.~db",
//!   "language": "english",
//!   "ignore_patterns": ["*.tmp", "node_modules"],
//!   "follow_symlinks": false,
//!   "protect_sidecar": true
//! }
//! ```

use crate::error::{FolderCheckError, Result};
use crate::report::Language;
use crate::snapshot::DEFAULT_SIDECAR_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a [`FolderChecker`](crate::FolderChecker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Name of the per-directory side-car file
    pub sidecar_name: String,
    /// Directory substituted for a leading `~`; `None` uses the OS home
    pub home_dir: Option<PathBuf>,
    /// Language of status sentences
    pub language: Language,
    /// Glob patterns matched against entry names; matching files are not
    /// tracked and matching directories are not entered
    pub ignore_patterns: Vec<String>,
    /// Whether to descend into symbolic links to directories
    pub follow_symlinks: bool,
    /// Whether side-car files are marked read-only between runs
    pub protect_sidecar: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            sidecar_name: DEFAULT_SIDECAR_NAME.to_string(),
            home_dir: None,
            language: Language::default(),
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            protect_sidecar: true,
        }
    }
}

impl CheckerConfig {
    /// Load a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// - [`FolderCheckError::Io`] if the file cannot be read
    /// - [`FolderCheckError::Json`] if it is not valid configuration JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CheckerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the side-car name is a plain file name
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::InvalidConfiguration`] if the name is empty, `.`,
    /// `..` or contains a path separator.
    pub fn validate(&self) -> Result<()> {
        let name = self.sidecar_name.as_str();
        if name.is_empty() || name == "." || name == ".." {
            return Err(FolderCheckError::InvalidConfiguration(format!(
                "side-car name {:?} is not a file name",
                name
            )));
        }
        if name.contains(['/', '\\']) {
            return Err(FolderCheckError::InvalidConfiguration(format!(
                "side-car name {:?} must not contain a path separator",
                name
            )));
        }
        Ok(())
    }
}
