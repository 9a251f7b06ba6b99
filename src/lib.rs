//! # foldercheck - per-directory change detection
//!
//! Walks a directory tree and reports, for every directory, which files were
//! added, modified or deleted since the previous run.
//!
//! ## Overview
//!
//! Each directory keeps its own small side-car file (`fileinfo.~db` by
//! default) mapping every file name to a content digest and a version
//! counter. A run:
//!
//! - loads the side-car of a directory
//! - hashes the directory's files
//! - compares the two and reports the differences
//! - saves the new side-car, read-only, through an atomic rename
//!
//! and then moves on to the subdirectories, depth-first in pre-order. A
//! purge run deletes all side-car files instead.
//!
//! Failures are isolated: an unreadable file or a corrupt side-car turns into
//! an error entry for that one directory, a folder whose subdirectories
//! cannot be listed gets a note, and the walk continues everywhere else.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foldercheck::{CheckRequest, FolderChecker};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let checker = FolderChecker::builder().build()?;
//!
//! // First run records a baseline
//! print!("{}", checker.run(&CheckRequest::check("~/documents")));
//!
//! // Later runs report changes:
//! //   Checking: ~/documents
//! //   [M] report.odt (version 2)
//! //   [A] notes.txt
//! print!("{}", checker.run(&CheckRequest::check("~/documents")));
//! # Ok(())
//! # }
//! ```
//!
//! ## Structured results
//!
//! ```rust,no_run
//! use foldercheck::{FolderChecker, Language};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let checker = FolderChecker::builder()
//!     .language(Language::English)
//!     .ignore_patterns(vec!["*.tmp".to_string(), ".git".to_string()])
//!     .build()?;
//!
//! let report = checker.check("~/projects")?;
//! let stats = report.stats();
//! println!("{} directories, {} changes", stats.directories_visited, stats.total_changes());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing against memory
//!
//! All disk access goes through [`fs::FileSystem`]. [`fs::MemoryFileSystem`]
//! can stand in for the real disk and simulate denied listings, unreadable
//! files and failing writes.
//!
//! ## Module Organization
//!
//! - [`checker`]: Facade and builder
//! - [`config`]: Run configuration
//! - [`paths`]: Root path expansion and display
//! - [`walker`]: Check and purge traversals
//! - [`snapshot`]: Side-car persistence
//! - [`diff`]: Snapshot comparison
//! - [`hasher`]: Content digests
//! - [`report`]: Text rendering
//! - [`fs`]: File system capability
//! - [`types`]: Common types and data structures
//! - [`error`]: Error types and handling

// Public API modules
pub mod checker;
pub mod config;
pub mod diff;
pub mod error;
pub mod fs;
pub mod hasher;
pub mod paths;
pub mod report;
pub mod snapshot;
pub mod types;
pub mod walker;

// Internal modules
mod collections;

// Re-export main types for convenience
pub use checker::{FolderChecker, FolderCheckerBuilder};
pub use config::CheckerConfig;
pub use error::{FolderCheckError, Result};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use report::{Language, Reporter};
pub use snapshot::{SnapshotStore, DEFAULT_SIDECAR_NAME};
pub use types::*;
