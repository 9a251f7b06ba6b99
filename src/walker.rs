//! Tree traversal
//!
//! Both walks visit directories depth-first in pre-order using an explicit
//! frame stack, so deep trees do not grow the call stack and a
//! [`CancellationToken`] can be checked between frames.
//!
//! - [`Walker`] loads each directory's snapshot, hashes its files, compares,
//!   and saves the new snapshot.
//! - [`PurgeWalker`] deletes each directory's side-car file.
//!
//! Failures stay local. A directory whose processing fails gets an error
//! entry and the walk moves on. A directory whose subdirectories cannot be
//! listed gets a note and that branch is skipped.

use crate::collections::HashSet;
use crate::diff;
use crate::error::{FolderCheckError, Result};
use crate::fs::{DirEntry, EntryKind, FileSystem};
use crate::hasher::hash_reader;
use crate::paths::ResolvedRoot;
use crate::snapshot::SnapshotStore;
use crate::types::{
    CancellationToken, CheckReport, DirectoryNote, DirectoryOutcome, DirectoryReport, ProgressCallback,
    ProgressInfo, PurgeEntry, PurgeReport, ScannedFile,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Prefix of temporary files written while saving a side-car
const TEMP_PREFIX: &str = ".foldercheck-";

/// Decides which directory entries take part in a walk
#[derive(Debug, Clone)]
pub struct EntryFilter {
    sidecar_name: String,
    ignore: Option<GlobSet>,
    follow_symlinks: bool,
}

impl EntryFilter {
    /// Create a filter excluding the side-car and anything matching `patterns`
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::InvalidPattern`] if a pattern is not a valid glob.
    pub fn new(sidecar_name: impl Into<String>, patterns: &[String], follow_symlinks: bool) -> Result<Self> {
        let ignore = if patterns.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in patterns {
                let glob = Glob::new(pattern)
                    .map_err(|e| FolderCheckError::InvalidPattern(format!("{}: {}", pattern, e)))?;
                builder.add(glob);
            }
            Some(
                builder
                    .build()
                    .map_err(|e| FolderCheckError::InvalidPattern(e.to_string()))?,
            )
        };

        Ok(Self {
            sidecar_name: sidecar_name.into(),
            ignore,
            follow_symlinks,
        })
    }

    /// Whether `entry` is a file whose content is tracked
    pub fn tracks_file(&self, entry: &DirEntry) -> bool {
        entry.kind == EntryKind::File
            && entry.name != self.sidecar_name
            && !is_temp_artifact(&entry.name)
            && !self.is_ignored(&entry.name)
    }

    /// Whether the walk descends into `entry`
    pub fn enters_dir(&self, entry: &DirEntry) -> bool {
        entry.kind == EntryKind::Directory
            && (!entry.is_symlink || self.follow_symlinks)
            && !self.is_ignored(&entry.name)
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore.as_ref().is_some_and(|set| set.is_match(name))
    }
}

/// Leftover of an interrupted side-car save
fn is_temp_artifact(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(".tmp")
}

/// Per-directory result that can carry enumeration notes
trait WalkEntry {
    fn notes_mut(&mut self) -> &mut Vec<DirectoryNote>;
    fn label(&self) -> &str;
}

impl WalkEntry for DirectoryReport {
    fn notes_mut(&mut self) -> &mut Vec<DirectoryNote> {
        &mut self.notes
    }

    fn label(&self) -> &str {
        &self.display_path
    }
}

impl WalkEntry for PurgeEntry {
    fn notes_mut(&mut self) -> &mut Vec<DirectoryNote> {
        &mut self.notes
    }

    fn label(&self) -> &str {
        &self.display_path
    }
}

/// Shared frame-stack traversal
struct Traversal<'a> {
    fs: &'a dyn FileSystem,
    filter: &'a EntryFilter,
    cancel: &'a CancellationToken,
    progress: Option<&'a ProgressCallback>,
    operation: &'static str,
}

impl Traversal<'_> {
    /// Visit `root` and every reachable subdirectory in pre-order
    ///
    /// Returns the visit results and whether the walk was cancelled.
    fn run<T: WalkEntry>(&self, root: &Path, mut visit: impl FnMut(&Path) -> T) -> (Vec<T>, bool) {
        let mut stack = vec![root.to_path_buf()];
        let mut visited: HashSet<PathBuf> = HashSet::default();
        let mut results = Vec::new();

        while let Some(dir) = stack.pop() {
            if self.cancel.is_cancelled() {
                info!("{} cancelled after {} directories", self.operation, results.len());
                return (results, true);
            }

            if self.filter.follow_symlinks {
                let key = self.fs.canonicalize(&dir).unwrap_or_else(|_| dir.clone());
                if !visited.insert(key) {
                    debug!("Skipping {:?}, already visited through another link", dir);
                    continue;
                }
            }

            let mut entry = visit(&dir);

            match self.subdirectories(&dir) {
                // Reversed so the first child is popped first
                Ok(children) => stack.extend(children.into_iter().rev()),
                Err(e) => {
                    warn!("Not descending into {:?}: {}", dir, e);
                    entry.notes_mut().push(note_for(e));
                }
            }

            if let Some(callback) = self.progress {
                callback(ProgressInfo {
                    operation: self.operation.to_string(),
                    current_item: Some(entry.label().to_string()),
                    processed: results.len() + 1,
                });
            }
            results.push(entry);
        }

        (results, false)
    }

    fn subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|e| FolderCheckError::listing(dir, e))?;

        let mut names: Vec<String> = entries
            .into_iter()
            .filter(|e| self.filter.enters_dir(e))
            .map(|e| e.name)
            .collect();
        names.sort();

        Ok(names.into_iter().map(|name| dir.join(name)).collect())
    }
}

fn note_for(error: FolderCheckError) -> DirectoryNote {
    match error {
        FolderCheckError::DirectoryUnauthorized(_) => DirectoryNote::Unauthorized,
        FolderCheckError::DirectoryListing { source, .. } => DirectoryNote::ListingFailed {
            message: source.to_string(),
        },
        other => DirectoryNote::ListingFailed {
            message: other.to_string(),
        },
    }
}

/// Walks a tree, diffing and saving each directory's snapshot
#[derive(Clone)]
pub struct Walker {
    fs: Arc<dyn FileSystem>,
    store: SnapshotStore,
    filter: EntryFilter,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("store", &self.store)
            .field("filter", &self.filter)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Walker {
    /// Create a walker
    pub fn new(fs: Arc<dyn FileSystem>, store: SnapshotStore, filter: EntryFilter) -> Self {
        Self {
            fs,
            store,
            filter,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Stop between directories once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report progress after each directory
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Check the whole tree under `root`
    pub fn run(&self, root: &ResolvedRoot) -> CheckReport {
        let traversal = Traversal {
            fs: self.fs.as_ref(),
            filter: &self.filter,
            cancel: &self.cancel,
            progress: self.progress.as_ref(),
            operation: "Checking",
        };

        let (directories, cancelled) = traversal.run(root.path(), |dir| self.visit(dir, root.display(dir)));
        CheckReport { directories, cancelled }
    }

    /// Check a single directory without descending
    pub fn visit(&self, dir: &Path, display_path: String) -> DirectoryReport {
        debug!("Checking {:?}", dir);

        let outcome = match self.process(dir) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to process {:?}: {}", dir, e);
                DirectoryOutcome::Error { message: e.to_string() }
            }
        };

        DirectoryReport {
            path: dir.to_path_buf(),
            display_path,
            outcome,
            notes: Vec::new(),
        }
    }

    fn process(&self, dir: &Path) -> Result<DirectoryOutcome> {
        let previous = self.store.load(dir)?;
        let current = self.scan(dir)?;
        let diff = diff::compare(previous.as_ref(), &current)?;

        self.store.save(dir, &diff.snapshot)?;

        Ok(match previous {
            None => DirectoryOutcome::NewDirectory,
            Some(_) => DirectoryOutcome::Existing { changes: diff.changes },
        })
    }

    /// Hash every tracked file of `dir`, sorted by name
    fn scan(&self, dir: &Path) -> Result<Vec<ScannedFile>> {
        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|e| FolderCheckError::listing(dir, e))?;

        let mut names: Vec<String> = entries
            .into_iter()
            .filter(|e| self.filter.tracks_file(e))
            .map(|e| e.name)
            .collect();
        names.sort();

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(&name);
            let digest_err = |source| FolderCheckError::DigestIo { path: path.clone(), source };

            let reader = self.fs.open(&path).map_err(digest_err)?;
            let hash = hash_reader(reader).map_err(digest_err)?;

            trace!("Hashed {:?}: {}", path, hash);
            files.push(ScannedFile::new(name, hash));
        }

        Ok(files)
    }
}

/// Walks a tree, deleting each directory's side-car file
#[derive(Clone)]
pub struct PurgeWalker {
    fs: Arc<dyn FileSystem>,
    store: SnapshotStore,
    filter: EntryFilter,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for PurgeWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurgeWalker")
            .field("store", &self.store)
            .field("filter", &self.filter)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl PurgeWalker {
    /// Create a purge walker
    pub fn new(fs: Arc<dyn FileSystem>, store: SnapshotStore, filter: EntryFilter) -> Self {
        Self {
            fs,
            store,
            filter,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Stop between directories once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report progress after each directory
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Delete the side-car files of the whole tree under `root`
    pub fn run(&self, root: &ResolvedRoot) -> PurgeReport {
        let traversal = Traversal {
            fs: self.fs.as_ref(),
            filter: &self.filter,
            cancel: &self.cancel,
            progress: self.progress.as_ref(),
            operation: "Deleting",
        };

        let (entries, cancelled) = traversal.run(root.path(), |dir| {
            let sidecar = self.store.sidecar_path(dir);
            let display_path = root.display(&sidecar);
            let (removed, error) = match self.store.remove(dir) {
                Ok(removed) => (removed, None),
                Err(e) => {
                    warn!("Failed to delete side-car in {:?}: {}", dir, e);
                    (false, Some(e.to_string()))
                }
            };

            PurgeEntry {
                directory: dir.to_path_buf(),
                sidecar,
                display_path,
                removed,
                error,
                notes: Vec::new(),
            }
        });

        PurgeReport { entries, cancelled }
    }
}
