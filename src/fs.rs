//! File system capability
//!
//! Everything the engine does to the disk goes through the [`FileSystem`]
//! trait: listing a folder, reading a file, writing the side-car atomically,
//! toggling its protection and removing it. [`OsFileSystem`] talks to the real
//! file system, [`MemoryFileSystem`] keeps a tree in memory and can simulate
//! denied listings, unreadable files and failing writes.
//!
//! ## Example
//!
//! ```rust
//! use foldercheck::fs::{FileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file("/data/a.txt", b"hello");
//! fs.create_dir_all("/data/sub");
//!
//! let entries = fs.read_dir(Path::new("/data")).unwrap();
//! assert_eq!(entries.len(), 2);
//! ```

use crate::collections::HashSet;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Kind of a directory entry, with symbolic links resolved to their target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Anything else (sockets, devices, dangling links)
    Other,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name relative to the listed directory
    pub name: String,
    /// What the entry is (after following a symbolic link)
    pub kind: EntryKind,
    /// Whether the entry itself is a symbolic link
    pub is_symlink: bool,
}

impl DirEntry {
    /// Create a non-symlink entry
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_symlink: false,
        }
    }
}

/// Capability for all disk access performed by the engine
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Whether `path` is an existing directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether anything exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// List the immediate entries of a directory
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Open a file for reading
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Read a whole file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.open(path)?.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Replace the content of `path` so that readers see either the old or
    /// the new content, never a truncated file. [`OsFileSystem`] creates the
    /// file hidden on Windows
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Apply (`true`) or clear (`false`) the read-only protection of a file
    fn set_protected(&self, path: &Path, protected: bool) -> io::Result<()>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Resolve symbolic links in `path`
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl OsFileSystem {
    /// Create a new OS file system handle
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for OsFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!("Skipping entry with non UTF-8 name {:?} in {:?}", raw, path);
                    continue;
                }
            };

            let file_type = entry.file_type()?;
            let is_symlink = file_type.is_symlink();
            let kind = if is_symlink {
                match fs::metadata(entry.path()) {
                    Ok(target) if target.is_dir() => EntryKind::Directory,
                    Ok(target) if target.is_file() => EntryKind::File,
                    _ => EntryKind::Other,
                }
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            entries.push(DirEntry { name, kind, is_symlink });
        }

        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(path)?))
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let dir = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("{:?} has no parent directory", path))
        })?;

        let mut temp = tempfile::Builder::new()
            .prefix(".foldercheck-")
            .suffix(".tmp")
            .make_in(dir, |temp_path| create_sidecar_file(temp_path))?;
        temp.as_file_mut().write_all(contents)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        trace!("Atomically wrote {} bytes to {:?}", contents.len(), path);
        Ok(())
    }

    fn set_protected(&self, path: &Path, protected: bool) -> io::Result<()> {
        set_readonly(path, protected)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

/// Create the temp file behind an atomic write with the mode a plain file would get.
///
/// Hiding is a no-op on Unix; side-car names are left as configured.
#[cfg(unix)]
fn create_sidecar_file(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new().write(true).create_new(true).mode(0o666).open(path)
}

#[cfg(windows)]
const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

/// Create the temp file behind an atomic write with the hidden attribute set.
/// The rename onto the target keeps it.
#[cfg(windows)]
fn create_sidecar_file(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .attributes(FILE_ATTRIBUTE_HIDDEN)
        .open(path)
}

#[cfg(not(any(unix, windows)))]
fn create_sidecar_file(path: &Path) -> io::Result<File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

/// Toggle write permission (Unix): clears every write bit, restores the owner's
#[cfg(unix)]
fn set_readonly(path: &Path, readonly: bool) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode();
    let mode = if readonly { mode & !0o222 } else { mode | 0o200 };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// Toggle the read-only attribute (Windows). Other attributes, hidden included, are kept
#[cfg(not(unix))]
fn set_readonly(path: &Path, readonly: bool) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(readonly);
    fs::set_permissions(path, perms)
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    protected: bool,
}

#[derive(Debug)]
struct MemoryState {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, MemoryFile>,
    denied_listings: HashSet<PathBuf>,
    unreadable: HashSet<PathBuf>,
    failing_writes: HashSet<PathBuf>,
}

impl MemoryState {
    fn add_dir_all(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// In-memory [`FileSystem`] for deterministic tests
///
/// Directories are created implicitly when files are written. Faults can be
/// injected per path with [`deny_listing`](Self::deny_listing),
/// [`make_unreadable`](Self::make_unreadable) and
/// [`fail_writes_in`](Self::fail_writes_in). Writing over a protected file
/// through [`FileSystem::write_atomic`] fails, so callers must clear the
/// protection first.
#[derive(Debug)]
pub struct MemoryFileSystem {
    state: Mutex<MemoryState>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    /// Create an empty file system
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                dirs: BTreeSet::new(),
                files: BTreeMap::new(),
                denied_listings: HashSet::default(),
                unreadable: HashSet::default(),
                failing_writes: HashSet::default(),
            }),
        }
    }

    /// Create a directory and all of its parents
    pub fn create_dir_all(&self, path: impl AsRef<Path>) {
        self.state.lock().add_dir_all(path.as_ref());
    }

    /// Create or overwrite a file as a user would, ignoring protection
    pub fn write_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        let path = path.as_ref();
        let mut state = self.state.lock();
        if let Some(parent) = path.parent() {
            state.add_dir_all(parent);
        }
        let protected = state.files.get(path).map(|f| f.protected).unwrap_or(false);
        state.files.insert(
            path.to_path_buf(),
            MemoryFile {
                content: content.as_ref().to_vec(),
                protected,
            },
        );
    }

    /// Delete a file as a user would; returns whether it existed
    pub fn delete_file(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().files.remove(path.as_ref()).is_some()
    }

    /// Content of a file, if present
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state.lock().files.get(path.as_ref()).map(|f| f.content.clone())
    }

    /// Whether the file at `path` carries read-only protection
    pub fn is_protected(&self, path: impl AsRef<Path>) -> bool {
        self.state
            .lock()
            .files
            .get(path.as_ref())
            .map(|f| f.protected)
            .unwrap_or(false)
    }

    /// Make listing `path` fail with `PermissionDenied`
    pub fn deny_listing(&self, path: impl AsRef<Path>) {
        self.state.lock().denied_listings.insert(path.as_ref().to_path_buf());
    }

    /// Make opening `path` fail with `PermissionDenied`
    pub fn make_unreadable(&self, path: impl AsRef<Path>) {
        self.state.lock().unreadable.insert(path.as_ref().to_path_buf());
    }

    /// Make every write or removal inside directory `path` fail
    pub fn fail_writes_in(&self, path: impl AsRef<Path>) {
        self.state.lock().failing_writes.insert(path.as_ref().to_path_buf());
    }

    fn check_writable(state: &MemoryState, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if state.failing_writes.contains(parent) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("simulated write failure in {:?}", parent),
            )),
            Some(parent) if !state.dirs.contains(parent) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory {:?} does not exist", parent),
            )),
            _ => Ok(()),
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        self.state.lock().dirs.contains(path)
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.state.lock();
        if state.denied_listings.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("listing {:?} denied", path),
            ));
        }
        if !state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{:?} is not a directory", path),
            ));
        }

        let child_name = |child: &Path| -> Option<String> {
            match child.parent() {
                Some(parent) if parent == path => {
                    child.file_name().map(|n| n.to_string_lossy().into_owned())
                }
                _ => None,
            }
        };

        let mut entries: Vec<DirEntry> = state
            .dirs
            .iter()
            .filter_map(|d| child_name(d))
            .map(|name| DirEntry::new(name, EntryKind::Directory))
            .collect();
        entries.extend(
            state
                .files
                .keys()
                .filter_map(|f| child_name(f))
                .map(|name| DirEntry::new(name, EntryKind::File)),
        );
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let state = self.state.lock();
        if state.unreadable.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("reading {:?} denied", path),
            ));
        }
        let file = state
            .files
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{:?} not found", path)))?;
        Ok(Box::new(Cursor::new(file.content.clone())))
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        Self::check_writable(&state, path)?;
        if state.files.get(path).map(|f| f.protected).unwrap_or(false) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{:?} is read-only", path),
            ));
        }
        state.files.insert(
            path.to_path_buf(),
            MemoryFile {
                content: contents.to_vec(),
                protected: false,
            },
        );
        Ok(())
    }

    fn set_protected(&self, path: &Path, protected: bool) -> io::Result<()> {
        let mut state = self.state.lock();
        Self::check_writable(&state, path)?;
        let file = state
            .files
            .get_mut(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{:?} not found", path)))?;
        file.protected = protected;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        Self::check_writable(&state, path)?;
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{:?} not found", path)))
    }
}
