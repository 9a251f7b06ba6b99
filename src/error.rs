//! Error types for foldercheck
//!
//! This module defines every error that can occur while checking or purging a
//! directory tree. Only [`FolderCheckError::RootNotFound`] and configuration
//! errors end a run; the rest are recovered at directory granularity and end
//! up as lines in the report.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the foldercheck library
pub type Result<T> = std::result::Result<T, FolderCheckError>;

/// Main error type for all foldercheck operations
#[derive(Debug, Error)]
pub enum FolderCheckError {
    /// The root path does not denote an existing directory
    #[error("Folder not found: {0:?}")]
    RootNotFound(PathBuf),

    /// Listing the subdirectories of a folder was denied
    #[error("Unauthorized access on folder: {0:?}")]
    DirectoryUnauthorized(PathBuf),

    /// Listing a folder failed for a reason other than permissions
    #[error("Cannot list folder {path:?}: {source}")]
    DirectoryListing {
        /// Folder that could not be listed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file could not be read completely while computing its digest
    #[error("Cannot hash file {path:?}: {source}")]
    DigestIo {
        /// File being hashed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The side-car file exists but cannot be parsed
    #[error("Corrupt snapshot {path:?}: {reason}")]
    CorruptSnapshot {
        /// Path of the side-car file
        path: PathBuf,
        /// What was wrong with its content
        reason: String,
    },

    /// The side-car file exists but cannot be read
    #[error("Cannot read snapshot {path:?}: {source}")]
    SnapshotRead {
        /// Path of the side-car file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Clearing attributes, writing or protecting the side-car file failed
    #[error("Cannot write snapshot {path:?}: {source}")]
    SnapshotWrite {
        /// Path of the side-car file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Removing a side-car file during a purge failed
    #[error("Cannot delete {path:?}: {source}")]
    SidecarRemove {
        /// Path of the side-car file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Ignore pattern does not compile
    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),

    /// I/O errors outside of a specific directory visit
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored version is already at the largest representable value
    #[error("Version {version} of {filename:?} cannot be incremented")]
    VersionOverflow {
        /// File whose version would overflow
        filename: String,
        /// Stored version
        version: u32,
    },
}

impl FolderCheckError {
    /// Create a corrupt snapshot error for the given side-car file
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        FolderCheckError::CorruptSnapshot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Classify a failed directory listing
    ///
    /// Permission denial becomes [`FolderCheckError::DirectoryUnauthorized`],
    /// everything else [`FolderCheckError::DirectoryListing`].
    pub fn listing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            FolderCheckError::DirectoryUnauthorized(path)
        } else {
            FolderCheckError::DirectoryListing { path, source }
        }
    }

    /// Check if this error is recovered at directory granularity
    ///
    /// Such errors turn into a report line for the affected directory while
    /// the walk continues with its siblings and subdirectories.
    pub fn is_directory_scoped(&self) -> bool {
        matches!(
            self,
            FolderCheckError::DirectoryUnauthorized(_)
                | FolderCheckError::DirectoryListing { .. }
                | FolderCheckError::DigestIo { .. }
                | FolderCheckError::CorruptSnapshot { .. }
                | FolderCheckError::SnapshotRead { .. }
                | FolderCheckError::SnapshotWrite { .. }
                | FolderCheckError::SidecarRemove { .. }
                | FolderCheckError::VersionOverflow { .. }
        )
    }

    /// Check if this error indicates a damaged side-car file
    pub fn is_corruption(&self) -> bool {
        matches!(self, FolderCheckError::CorruptSnapshot { .. })
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            FolderCheckError::InvalidPattern(_) => {
                format!("{}. Patterns are globs matched against entry names, e.g. `*.tmp` or `node_modules`.", self)
            }
            FolderCheckError::InvalidConfiguration(_) => {
                format!("{}. Check the command-line flags and the --config file.", self)
            }
            _ => self.to_string(),
        }
    }
}
