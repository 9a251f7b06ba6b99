//! Root path resolution
//!
//! Turns what the user typed into an absolute directory path: a leading `~`
//! becomes the configured home directory, repeated separators and `.`
//! components disappear, and relative paths are joined onto the configured
//! working directory. Both directories are injected, nothing is read from the
//! process environment here.
//!
//! ```rust
//! use foldercheck::paths::PathResolver;
//! use std::path::PathBuf;
//!
//! let resolver = PathResolver::new(Some(PathBuf::from("/home/jana")), PathBuf::from("/tmp"));
//! assert_eq!(resolver.expand("~//photos/./2024").unwrap(), PathBuf::from("/home/jana/photos/2024"));
//! assert_eq!(resolver.expand("notes").unwrap(), PathBuf::from("/tmp/notes"));
//! ```

use crate::error::{FolderCheckError, Result};
use crate::fs::FileSystem;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use tracing::debug;

/// Expands and validates user supplied root paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    home_dir: Option<PathBuf>,
    current_dir: PathBuf,
}

impl PathResolver {
    /// Create a resolver with explicit home and working directories
    pub fn new(home_dir: Option<PathBuf>, current_dir: PathBuf) -> Self {
        Self { home_dir, current_dir }
    }

    /// Home directory used for `~`
    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Expand `raw` into an absolute, normalized path
    ///
    /// Only a leading `~` that stands alone or is followed by a separator is
    /// expanded; `~user` and a `~` elsewhere in the path are kept literally.
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::RootNotFound`] if `raw` is empty or starts with `~`
    /// while no home directory is configured.
    pub fn expand(&self, raw: &str) -> Result<PathBuf> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FolderCheckError::RootNotFound(PathBuf::new()));
        }

        let collapsed = collapse_separators(trimmed);
        let expanded = match strip_home_prefix(&collapsed) {
            Some(rest) => {
                let home = self
                    .home_dir
                    .as_ref()
                    .ok_or_else(|| FolderCheckError::RootNotFound(PathBuf::from(trimmed)))?;
                if rest.is_empty() {
                    home.clone()
                } else {
                    home.join(rest)
                }
            }
            None => PathBuf::from(&collapsed),
        };

        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            self.current_dir.join(expanded)
        };

        Ok(normalize(&absolute))
    }

    /// Expand `raw` and check that it names an existing directory
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::RootNotFound`] if expansion fails or the result is
    /// not a directory.
    pub fn resolve(&self, raw: &str, fs: &dyn FileSystem) -> Result<ResolvedRoot> {
        let path = self.expand(raw)?;
        if !fs.is_dir(&path) {
            return Err(FolderCheckError::RootNotFound(path));
        }

        debug!("Resolved {:?} to {:?}", raw, path);
        Ok(ResolvedRoot {
            path,
            typed: raw.trim().to_string(),
        })
    }
}

/// An existing root directory together with the text the user typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoot {
    path: PathBuf,
    typed: String,
}

impl ResolvedRoot {
    /// Absolute root path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root as typed by the user
    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// Show `path` the way the user wrote the root
    ///
    /// With the root typed as `~/test`, `/home/u/test/sub` is shown as
    /// `~/test/sub`. Paths outside the root are shown unchanged.
    pub fn display(&self, path: &Path) -> String {
        let Ok(rest) = path.strip_prefix(&self.path) else {
            return path.display().to_string();
        };

        if rest.as_os_str().is_empty() {
            return self.typed.clone();
        }

        let base = self.typed.trim_end_matches(['/', MAIN_SEPARATOR]);
        if base.is_empty() {
            // Typed root was the filesystem root itself
            format!("{}{}", MAIN_SEPARATOR, rest.display())
        } else {
            format!("{}{}{}", base, MAIN_SEPARATOR, rest.display())
        }
    }
}

/// Return the remainder after a leading `~` or `~/`
fn strip_home_prefix(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('~')?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(['/', MAIN_SEPARATOR])
}

/// Collapse runs of separators into one
///
/// A leading pair of backslashes is kept on Windows so UNC paths survive.
fn collapse_separators(path: &str) -> String {
    let is_sep = |c: char| c == '/' || c == MAIN_SEPARATOR;
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    if cfg!(windows) && path.starts_with(r"\\") {
        out.push_str(r"\\");
        chars.next();
        chars.next();
    }

    let mut previous_sep = false;
    for c in chars {
        if is_sep(c) {
            if !previous_sep {
                out.push(c);
            }
            previous_sep = true;
        } else {
            out.push(c);
            previous_sep = false;
        }
    }
    out
}

/// Lexically drop `.` components and resolve `..` against preceding names
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
