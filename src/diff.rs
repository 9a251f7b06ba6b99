//! Snapshot comparison
//!
//! Compares the previous snapshot of one directory against a fresh scan and
//! assigns versions:
//!
//! - a name never seen before starts at version 1 and is reported as Added
//! - an unchanged digest keeps its version and is not reported
//! - a changed digest bumps the version by exactly one and is reported as Modified;
//!   a version that cannot grow fails the whole directory
//! - a name missing from the scan is reported once as Deleted and dropped
//!
//! Added and Modified entries follow the scan order; Deleted entries follow
//! them in the previous snapshot's order.
//!
//! ## Examples
//!
//! ```rust
//! use foldercheck::diff::compare;
//! use foldercheck::types::{FileChange, FileRecord, ScannedFile, Snapshot};
//!
//! let mut old = Snapshot::new();
//! old.insert("a.txt", FileRecord::new("h1", 1));
//! old.insert("b.txt", FileRecord::new("h2", 1));
//!
//! let scan = vec![ScannedFile::new("a.txt", "h1-changed"), ScannedFile::new("c.txt", "h3")];
//! let outcome = compare(Some(&old), &scan)?;
//!
//! assert_eq!(outcome.changes, vec![
//!     FileChange::modified("a.txt", 2),
//!     FileChange::added("c.txt"),
//!     FileChange::deleted("b.txt", 1),
//! ]);
//! assert_eq!(outcome.snapshot.get("a.txt").map(|r| r.version), Some(2));
//! assert!(!outcome.snapshot.contains("b.txt"));
//! # Ok::<(), foldercheck::FolderCheckError>(())
//! ```

use crate::collections::HashSet;
use crate::error::{FolderCheckError, Result};
use crate::types::{FileChange, FileRecord, ScannedFile, Snapshot};

/// Result of comparing one directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Reported changes
    pub changes: Vec<FileChange>,
    /// Snapshot to persist, holding exactly the scanned files
    pub snapshot: Snapshot,
}

/// Compare a previous snapshot (if any) with the current scan
///
/// Without a previous snapshot every file is recorded at version 1 and no
/// change is reported; the caller treats the directory as new.
///
/// # Errors
///
/// [`FolderCheckError::VersionOverflow`] if a modified file already carries
/// the largest version; nothing is reported for the directory then.
pub fn compare(old: Option<&Snapshot>, current: &[ScannedFile]) -> Result<DiffOutcome> {
    let Some(old) = old else {
        return Ok(DiffOutcome {
            changes: Vec::new(),
            snapshot: baseline(current),
        });
    };

    let mut changes = Vec::new();
    let mut snapshot = Snapshot::new();
    // Names of `old` matched by the scan; only used to find deletions
    let mut seen: HashSet<&str> = HashSet::default();

    for file in current {
        let version = match old.get(&file.name) {
            None => {
                changes.push(FileChange::added(&file.name));
                1
            }
            Some(previous) => {
                seen.insert(file.name.as_str());
                if previous.hash == file.hash {
                    previous.version
                } else {
                    let bumped = previous.version.checked_add(1).ok_or_else(|| {
                        FolderCheckError::VersionOverflow {
                            filename: file.name.clone(),
                            version: previous.version,
                        }
                    })?;
                    changes.push(FileChange::modified(&file.name, bumped));
                    bumped
                }
            }
        };
        snapshot.insert(file.name.clone(), FileRecord::new(file.hash.clone(), version));
    }

    changes.extend(
        old.iter()
            .filter(|(name, _)| !seen.contains(name))
            .map(|(name, record)| FileChange::deleted(name, record.version)),
    );

    Ok(DiffOutcome { changes, snapshot })
}

/// Snapshot of a directory seen for the first time
fn baseline(current: &[ScannedFile]) -> Snapshot {
    current
        .iter()
        .map(|file| (file.name.clone(), FileRecord::new(file.hash.clone(), 1)))
        .collect()
}
