//! Main facade
//!
//! [`FolderChecker`] wires path resolution, the walkers and the reporter
//! together. It is configured through [`FolderCheckerBuilder`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use foldercheck::{CheckRequest, FolderChecker, Language};
//!
//! # fn main() -> foldercheck::Result<()> {
//! let checker = FolderChecker::builder()
//!     .language(Language::English)
//!     .ignore_patterns(vec!["*.tmp".to_string()])
//!     .build()?;
//!
//! print!("{}", checker.run(&CheckRequest::check("~/photos")));
//! # Ok(())
//! # }
//! ```

use crate::config::CheckerConfig;
use crate::error::{FolderCheckError, Result};
use crate::fs::{FileSystem, OsFileSystem};
use crate::paths::{PathResolver, ResolvedRoot};
use crate::report::{Language, Reporter};
use crate::snapshot::SnapshotStore;
use crate::types::{CancellationToken, CheckReport, CheckRequest, ProgressCallback, PurgeReport};
use crate::walker::{EntryFilter, PurgeWalker, Walker};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// Checks directory trees for file changes
///
/// Every visited directory keeps a side-car snapshot of its files. A check
/// compares the current files with that snapshot, reports what changed and
/// saves the new snapshot. A purge deletes all side-cars under the root.
pub struct FolderChecker {
    config: CheckerConfig,
    fs: Arc<dyn FileSystem>,
    resolver: PathResolver,
    store: SnapshotStore,
    filter: EntryFilter,
    reporter: Reporter,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for FolderChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderChecker")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl FolderChecker {
    /// Start building a checker
    pub fn builder() -> FolderCheckerBuilder {
        FolderCheckerBuilder::new()
    }

    /// Configuration in effect
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Reporter matching the configured language
    pub fn reporter(&self) -> Reporter {
        self.reporter
    }

    /// Token that stops a running walk between directories
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolve `root_path` to an existing directory
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::RootNotFound`] if it does not exist.
    pub fn resolve(&self, root_path: &str) -> Result<ResolvedRoot> {
        self.resolver.resolve(root_path, self.fs.as_ref())
    }

    /// Check every directory under `root_path`
    ///
    /// Per-directory failures end up in the report. Only a missing root fails
    /// the whole call, and then nothing on disk is touched.
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::RootNotFound`] if `root_path` is not a directory.
    #[instrument(skip(self))]
    pub fn check(&self, root_path: &str) -> Result<CheckReport> {
        let root = self.resolve(root_path)?;
        info!("Checking {:?}", root.path());

        let walker = Walker::new(self.fs.clone(), self.store.clone(), self.filter.clone())
            .with_cancellation(self.cancel.clone())
            .with_progress(self.progress.clone());
        let report = walker.run(&root);

        let stats = report.stats();
        info!(
            "Checked {} directories: {} added, {} modified, {} deleted, {} failed",
            stats.directories_visited,
            stats.files_added,
            stats.files_modified,
            stats.files_deleted,
            stats.directories_failed
        );
        Ok(report)
    }

    /// Delete every side-car file under `root_path`
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::RootNotFound`] if `root_path` is not a directory.
    #[instrument(skip(self))]
    pub fn purge(&self, root_path: &str) -> Result<PurgeReport> {
        let root = self.resolve(root_path)?;
        info!("Purging side-car files under {:?}", root.path());

        let walker = PurgeWalker::new(self.fs.clone(), self.store.clone(), self.filter.clone())
            .with_cancellation(self.cancel.clone())
            .with_progress(self.progress.clone());
        let report = walker.run(&root);

        info!(
            "Deleted {} side-car files in {} directories",
            report.removed_count(),
            report.entries.len()
        );
        Ok(report)
    }

    /// Execute `request` and render the result as text
    pub fn run(&self, request: &CheckRequest) -> String {
        let rendered = if request.purge {
            self.purge(&request.root_path)
                .map(|report| self.reporter.render_purge(&report))
        } else {
            self.check(&request.root_path)
                .map(|report| self.reporter.render_check(&report))
        };

        match rendered {
            Ok(text) => text,
            Err(FolderCheckError::RootNotFound(_)) => self.reporter.folder_not_found(),
            Err(e) => format!("{}\n", e),
        }
    }
}

/// Builder for [`FolderChecker`]
pub struct FolderCheckerBuilder {
    config: CheckerConfig,
    fs: Option<Arc<dyn FileSystem>>,
    current_dir: Option<PathBuf>,
    progress: Option<ProgressCallback>,
    cancel: Option<CancellationToken>,
}

impl Default for FolderCheckerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FolderCheckerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderCheckerBuilder")
            .field("config", &self.config)
            .field("current_dir", &self.current_dir)
            .finish()
    }
}

impl FolderCheckerBuilder {
    /// Create a builder with default settings
    ///
    /// # Examples
    ///
    /// ```rust
    /// use foldercheck::FolderCheckerBuilder;
    ///
    /// let builder = FolderCheckerBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            config: CheckerConfig::default(),
            fs: None,
            current_dir: None,
            progress: None,
            cancel: None,
        }
    }

    /// Replace every configuration field at once
    pub fn config(mut self, config: CheckerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the side-car file name
    pub fn sidecar_name(mut self, name: impl Into<String>) -> Self {
        self.config.sidecar_name = name.into();
        self
    }

    /// Set the directory a leading `~` expands to
    pub fn home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.config.home_dir = Some(home.into());
        self
    }

    /// Set the language of status sentences
    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    /// Set ignore patterns
    ///
    /// Glob patterns matched against entry names. Matching files are not
    /// tracked and matching directories are not entered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use foldercheck::FolderCheckerBuilder;
    ///
    /// let builder = FolderCheckerBuilder::new()
    ///     .ignore_patterns(vec!["*.log".to_string(), "node_modules".to_string()]);
    /// ```
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.ignore_patterns = patterns;
        self
    }

    /// Descend into symbolic links to directories
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    /// Mark side-car files read-only between runs
    pub fn protect_sidecar(mut self, protect: bool) -> Self {
        self.config.protect_sidecar = protect;
        self
    }

    /// Use `fs` for all disk access instead of the OS file system
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Directory relative root paths are joined onto
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Receive progress after each directory
    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Share a cancellation token with the caller
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validate the configuration and build the checker
    ///
    /// # Errors
    ///
    /// - [`FolderCheckError::InvalidConfiguration`] for a bad side-car name
    /// - [`FolderCheckError::InvalidPattern`] if an ignore pattern does not compile
    /// - [`FolderCheckError::Io`] if the current directory cannot be determined
    pub fn build(self) -> Result<FolderChecker> {
        self.config.validate()?;

        let filter = EntryFilter::new(
            self.config.sidecar_name.clone(),
            &self.config.ignore_patterns,
            self.config.follow_symlinks,
        )?;

        let current_dir = match self.current_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let home_dir = self.config.home_dir.clone().or_else(dirs::home_dir);

        let fs = self.fs.unwrap_or_else(|| Arc::new(OsFileSystem::new()));
        let store = SnapshotStore::new(fs.clone(), self.config.sidecar_name.clone())
            .with_protection(self.config.protect_sidecar);

        Ok(FolderChecker {
            resolver: PathResolver::new(home_dir, current_dir),
            reporter: Reporter::new(self.config.language),
            cancel: self.cancel.unwrap_or_default(),
            progress: self.progress,
            config: self.config,
            fs,
            store,
            filter,
        })
    }
}
