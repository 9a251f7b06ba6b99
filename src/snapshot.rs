//! Side-car snapshot persistence
//!
//! Every checked directory holds one side-car file (default `fileinfo.~db`)
//! describing its own immediate files as a JSON object:
//!
//! ```text
//! {"a.txt":{"hash":"9f86d0…","version":2},"c.txt":{"hash":"2c26b4…","version":1}}
//! ```
//!
//! Between runs the file is read-only. Saving clears the protection, replaces
//! the content through a temporary file renamed into place, then protects the
//! file again, so an interrupted save never leaves a truncated side-car.

use crate::error::{FolderCheckError, Result};
use crate::fs::FileSystem;
use crate::types::Snapshot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Default side-car file name
pub const DEFAULT_SIDECAR_NAME: &str = "fileinfo.~db";

/// Loads, saves and removes per-directory side-car files
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    fs: Arc<dyn FileSystem>,
    sidecar_name: String,
    protect: bool,
}

impl SnapshotStore {
    /// Create a store writing side-cars named `sidecar_name`
    pub fn new(fs: Arc<dyn FileSystem>, sidecar_name: impl Into<String>) -> Self {
        Self {
            fs,
            sidecar_name: sidecar_name.into(),
            protect: true,
        }
    }

    /// Whether saved side-cars are marked read-only (default `true`)
    pub fn with_protection(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }

    /// Name of the side-car file
    pub fn sidecar_name(&self) -> &str {
        &self.sidecar_name
    }

    /// Path of the side-car file inside `dir`
    pub fn sidecar_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.sidecar_name)
    }

    /// Load the snapshot of `dir`
    ///
    /// Returns `Ok(None)` when the directory has no side-car yet.
    ///
    /// # Errors
    ///
    /// - [`FolderCheckError::SnapshotRead`] if the side-car cannot be read
    /// - [`FolderCheckError::CorruptSnapshot`] if it is not a JSON object of
    ///   `{hash, version}` records or a version is 0
    pub fn load(&self, dir: &Path) -> Result<Option<Snapshot>> {
        let path = self.sidecar_path(dir);
        if !self.fs.exists(&path) {
            trace!("No side-car in {:?}", dir);
            return Ok(None);
        }

        let bytes = self
            .fs
            .read(&path)
            .map_err(|source| FolderCheckError::SnapshotRead { path: path.clone(), source })?;

        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| FolderCheckError::corrupt(&path, e.to_string()))?;

        if let Some((name, _)) = snapshot.iter().find(|(_, record)| record.version == 0) {
            return Err(FolderCheckError::corrupt(
                &path,
                format!("version of {:?} must be at least 1", name),
            ));
        }

        debug!("Loaded {} records from {:?}", snapshot.len(), path);
        Ok(Some(snapshot))
    }

    /// Persist `snapshot` as the side-car of `dir`
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::SnapshotWrite`] if clearing the protection, writing
    /// or re-protecting fails. A failed write leaves the previous side-car in
    /// place.
    pub fn save(&self, dir: &Path, snapshot: &Snapshot) -> Result<()> {
        let path = self.sidecar_path(dir);
        let json = serde_json::to_vec(snapshot)?;
        let write_err = |source| FolderCheckError::SnapshotWrite { path: path.clone(), source };

        if self.fs.exists(&path) {
            self.fs.set_protected(&path, false).map_err(write_err)?;
        }

        self.fs.write_atomic(&path, &json).map_err(write_err)?;

        if self.protect {
            self.fs.set_protected(&path, true).map_err(write_err)?;
        }

        debug!("Saved {} records to {:?}", snapshot.len(), path);
        Ok(())
    }

    /// Delete the side-car of `dir`
    ///
    /// Returns whether a side-car existed.
    ///
    /// # Errors
    ///
    /// [`FolderCheckError::SidecarRemove`] if it exists but cannot be deleted.
    pub fn remove(&self, dir: &Path) -> Result<bool> {
        let path = self.sidecar_path(dir);
        if !self.fs.exists(&path) {
            return Ok(false);
        }

        let remove_err = |source| FolderCheckError::SidecarRemove { path: path.clone(), source };
        self.fs.set_protected(&path, false).map_err(remove_err)?;
        self.fs.remove_file(&path).map_err(remove_err)?;

        debug!("Removed {:?}", path);
        Ok(true)
    }
}
