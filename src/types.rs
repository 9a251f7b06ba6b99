//! Core data types used throughout foldercheck
//!
//! ## Overview
//!
//! - **Persisted state**: [`FileRecord`], [`Snapshot`] - what a side-car file holds
//! - **Comparison results**: [`FileChange`], [`DirectoryOutcome`], [`DirectoryReport`]
//! - **Run results**: [`CheckReport`], [`PurgeReport`], [`ChangeStats`]
//! - **Run control**: [`CheckRequest`], [`CancellationToken`], [`ProgressInfo`]
//!
//! ## Examples
//!
//! ```rust
//! use foldercheck::types::{FileRecord, Snapshot};
//!
//! let mut snapshot = Snapshot::new();
//! snapshot.insert("a.txt", FileRecord::new("abc123", 1));
//! assert_eq!(snapshot.get("a.txt").map(|r| r.version), Some(1));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Last known state of one tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Hex content digest
    #[serde(alias = "Hash")]
    pub hash: String,
    /// Version counter, starts at 1
    #[serde(alias = "Version")]
    pub version: u32,
}

impl FileRecord {
    /// Create a record
    pub fn new(hash: impl Into<String>, version: u32) -> Self {
        Self {
            hash: hash.into(),
            version,
        }
    }
}

/// Per-directory mapping of filename to [`FileRecord`]
///
/// Iteration is ordered by filename. Serializes as a plain JSON object, which
/// is the side-car file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    files: BTreeMap<String, FileRecord>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `name`
    pub fn insert(&mut self, name: impl Into<String>, record: FileRecord) {
        self.files.insert(name.into(), record);
    }

    /// Record for `name`, if tracked
    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.files.get(name)
    }

    /// Whether `name` is tracked
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Number of tracked files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file is tracked
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over `(name, record)` pairs in filename order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.files.iter().map(|(name, record)| (name.as_str(), record))
    }
}

impl FromIterator<(String, FileRecord)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, FileRecord)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// A file seen while scanning a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Directory-local filename
    pub name: String,
    /// Hex content digest
    pub hash: String,
}

impl ScannedFile {
    /// Create a scanned file entry
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
        }
    }
}

/// How a file changed since the previous visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Not present in the previous snapshot
    Added,
    /// Present with a different digest
    Modified,
    /// Present in the previous snapshot, missing now
    Deleted,
}

/// One reported change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Directory-local filename
    pub filename: String,
    /// Kind of change
    pub kind: ChangeKind,
    /// New version for Added/Modified, last stored version for Deleted
    pub version: u32,
}

impl FileChange {
    /// A file seen for the first time
    pub fn added(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            kind: ChangeKind::Added,
            version: 1,
        }
    }

    /// A file whose digest changed, now at `version`
    pub fn modified(filename: impl Into<String>, version: u32) -> Self {
        Self {
            filename: filename.into(),
            kind: ChangeKind::Modified,
            version,
        }
    }

    /// A file that disappeared; `last_version` is informational only
    pub fn deleted(filename: impl Into<String>, last_version: u32) -> Self {
        Self {
            filename: filename.into(),
            kind: ChangeKind::Deleted,
            version: last_version,
        }
    }
}

/// Result of processing one directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryOutcome {
    /// No side-car existed; a baseline snapshot was written
    NewDirectory,
    /// A side-car existed; `changes` may be empty
    Existing {
        /// Added/Modified entries in listing order, then Deleted entries
        changes: Vec<FileChange>,
    },
    /// Processing failed; the side-car was left as it was
    Error {
        /// Message of the underlying error
        message: String,
    },
}

/// Problem enumerating the subdirectories of a visited directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryNote {
    /// Listing was denied; the branch was skipped
    Unauthorized,
    /// Listing failed for another reason; the branch was skipped
    ListingFailed {
        /// Message of the underlying error
        message: String,
    },
}

/// Report for one visited directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryReport {
    /// Absolute path of the directory
    pub path: PathBuf,
    /// Path as shown to the user
    pub display_path: String,
    /// What happened to the directory's snapshot
    pub outcome: DirectoryOutcome,
    /// Subdirectory enumeration problems
    pub notes: Vec<DirectoryNote>,
}

impl DirectoryReport {
    /// Changes reported for this directory (empty unless `Existing`)
    pub fn changes(&self) -> &[FileChange] {
        match &self.outcome {
            DirectoryOutcome::Existing { changes } => changes,
            _ => &[],
        }
    }

    /// Whether processing this directory failed
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, DirectoryOutcome::Error { .. })
    }
}

/// Aggregated result of a check run, in depth-first pre-order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// One entry per visited directory
    pub directories: Vec<DirectoryReport>,
    /// Whether the run stopped early because it was cancelled
    pub cancelled: bool,
}

impl CheckReport {
    /// Compute summary statistics
    pub fn stats(&self) -> ChangeStats {
        let mut stats = ChangeStats::default();
        for dir in &self.directories {
            stats.directories_visited += 1;
            match &dir.outcome {
                DirectoryOutcome::NewDirectory => stats.directories_new += 1,
                DirectoryOutcome::Error { .. } => stats.directories_failed += 1,
                DirectoryOutcome::Existing { changes } => {
                    for change in changes {
                        match change.kind {
                            ChangeKind::Added => stats.files_added += 1,
                            ChangeKind::Modified => stats.files_modified += 1,
                            ChangeKind::Deleted => stats.files_deleted += 1,
                        }
                    }
                }
            }
        }
        stats
    }

    /// Report for the directory at `path`, if it was visited
    pub fn directory(&self, path: &std::path::Path) -> Option<&DirectoryReport> {
        self.directories.iter().find(|d| d.path == path)
    }
}

/// Result of purging one directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeEntry {
    /// Absolute path of the directory
    pub directory: PathBuf,
    /// Absolute path of its side-car file
    pub sidecar: PathBuf,
    /// Side-car path as shown to the user
    pub display_path: String,
    /// Whether a side-car existed and was deleted
    pub removed: bool,
    /// Message if deleting failed
    pub error: Option<String>,
    /// Subdirectory enumeration problems
    pub notes: Vec<DirectoryNote>,
}

/// Aggregated result of a purge run, in depth-first pre-order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    /// One entry per visited directory
    pub entries: Vec<PurgeEntry>,
    /// Whether the run stopped early because it was cancelled
    pub cancelled: bool,
}

impl PurgeReport {
    /// Number of side-car files deleted
    pub fn removed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.removed).count()
    }
}

/// Statistics over a [`CheckReport`]
///
/// # Examples
///
/// ```rust
/// # use foldercheck::types::ChangeStats;
/// let stats = ChangeStats {
///     files_added: 2,
///     files_modified: 1,
///     files_deleted: 1,
///     ..Default::default()
/// };
/// assert_eq!(stats.total_changes(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    /// Number of files added
    pub files_added: usize,
    /// Number of files modified
    pub files_modified: usize,
    /// Number of files deleted
    pub files_deleted: usize,
    /// Directories visited
    pub directories_visited: usize,
    /// Directories seen for the first time
    pub directories_new: usize,
    /// Directories whose processing failed
    pub directories_failed: usize,
}

impl ChangeStats {
    /// Check if there are any file changes
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }

    /// Total number of reported file changes
    pub fn total_changes(&self) -> usize {
        self.files_added + self.files_modified + self.files_deleted
    }
}

/// Invocation parameters: a root path as typed by the user and the purge flag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Root folder, may start with `~`
    pub root_path: String,
    /// Delete side-car files instead of checking
    #[serde(default)]
    pub purge: bool,
}

impl CheckRequest {
    /// Request a check of `root_path`
    pub fn check(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            purge: false,
        }
    }

    /// Request a purge of `root_path`
    pub fn purge(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            purge: true,
        }
    }
}

/// Cooperative cancellation flag, checked between directory visits
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Progress callback for long-running walks
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// Information passed to progress callbacks
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Operation being performed
    pub operation: String,
    /// Directory just processed
    pub current_item: Option<String>,
    /// Directories processed so far
    pub processed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: DirectoryOutcome) -> DirectoryReport {
        DirectoryReport {
            path: PathBuf::from("/d"),
            display_path: "/d".to_string(),
            outcome,
            notes: vec![],
        }
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("b.txt", FileRecord::new("bb", 3));
        snapshot.insert("a.txt", FileRecord::new("aa", 1));

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"a.txt":{"hash":"aa","version":1},"b.txt":{"hash":"bb","version":3}}"#
        );
    }

    #[test]
    fn test_snapshot_accepts_pascal_case_fields() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"a.txt":{"Hash":"aa","Version":4}}"#).unwrap();
        assert_eq!(snapshot.get("a.txt"), Some(&FileRecord::new("aa", 4)));
    }

    #[test]
    fn test_change_stats() {
        let check = CheckReport {
            directories: vec![
                report(DirectoryOutcome::NewDirectory),
                report(DirectoryOutcome::Existing {
                    changes: vec![
                        FileChange::added("c.txt"),
                        FileChange::modified("a.txt", 2),
                        FileChange::deleted("b.txt", 1),
                    ],
                }),
                report(DirectoryOutcome::Error {
                    message: "boom".to_string(),
                }),
            ],
            cancelled: false,
        };

        let stats = check.stats();
        assert_eq!(stats.directories_visited, 3);
        assert_eq!(stats.directories_new, 1);
        assert_eq!(stats.directories_failed, 1);
        assert_eq!(stats.total_changes(), 3);
        assert!(stats.has_changes());
    }

    #[test]
    fn test_cancellation_token_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
