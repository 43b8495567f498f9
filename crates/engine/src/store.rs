// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact store
//!
//! Every job owns `<root>/<job-id>/`. Separation tools write into shared
//! model directories (`<root>/<model>/<job-id>/`), which belong to the store
//! as a whole and are never handed to a single job. All filesystem mutation
//! by the pipeline and the sweeper goes through here.

use crate::error::StoreError;
use fx_core::JobId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// A top-level entry under the store root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub modified: SystemTime,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// A relative root is anchored at the current directory; tools run
    /// inside job directories and must only ever see absolute paths.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a job would own; pure path composition
    pub fn working_dir(&self, id: &JobId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Create the job's working directory (idempotent)
    pub fn reserve(&self, id: &JobId) -> Result<PathBuf, StoreError> {
        let dir = self.working_dir(id);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(dir)
    }

    /// Create a shared model-output directory (idempotent)
    pub fn reserve_shared(&self, name: &str) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(single_component(name)?);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(dir)
    }

    /// Path of `name` inside the job's working directory
    ///
    /// Never touches disk. Rejects absolute names and any `..` segment.
    pub fn resolve(&self, id: &JobId, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self.working_dir(id).join(contained(name)?))
    }

    /// Path of `name` inside a shared model directory
    pub fn resolve_shared(&self, shared: &str, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self
            .root
            .join(single_component(shared)?)
            .join(contained(name)?))
    }

    /// `path` relative to the root, for publishing
    pub fn relative(&self, path: &Path) -> Result<PathBuf, StoreError> {
        let rel = path
            .strip_prefix(&self.root)
            .map_err(|_| StoreError::OutsideRoot(path.to_path_buf()))?;
        if !is_contained(rel) {
            return Err(StoreError::OutsideRoot(path.to_path_buf()));
        }
        Ok(rel.to_path_buf())
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn size_non_zero(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    /// Recursively delete `path`
    ///
    /// A path that is already gone is not an error. Anything that is not
    /// strictly below the root is refused. Symlinks are unlinked, never followed.
    pub fn purge(&self, path: &Path) -> Result<(), StoreError> {
        match path.strip_prefix(&self.root) {
            Ok(rel) if is_contained(rel) => {}
            _ => return Err(StoreError::OutsideRoot(path.to_path_buf())),
        }

        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Copy an external file into the job's working directory as `name`
    pub fn import(&self, id: &JobId, source: &Path, name: &str) -> Result<PathBuf, StoreError> {
        let dest = self.resolve(id, name)?;
        fs::copy(source, &dest).map_err(|e| StoreError::io(&dest, e))?;
        Ok(dest)
    }

    /// Top-level entries under the root; a missing root has none
    pub fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        list(&self.root)
    }

    /// Entries one level inside a shared model directory
    pub fn shared_entries(&self, shared: &str) -> Result<Vec<Entry>, StoreError> {
        list(&self.root.join(single_component(shared)?))
    }
}

fn list(dir: &Path) -> Result<Vec<Entry>, StoreError> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    let mut entries = Vec::new();
    for item in read {
        let item = item.map_err(|e| StoreError::io(dir, e))?;
        let path = item.path();
        // Raced with a delete
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        entries.push(Entry {
            name: item.file_name().to_string_lossy().into_owned(),
            path,
            is_dir: meta.is_dir(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn contained(name: &str) -> Result<&Path, StoreError> {
    let path = Path::new(name);
    if name.is_empty() || !is_contained(path) {
        return Err(StoreError::Traversal(name.to_string()));
    }
    Ok(path)
}

fn single_component(name: &str) -> Result<&Path, StoreError> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => Err(StoreError::Traversal(name.to_string())),
    }
}

/// True when `rel` has at least one normal component and nothing else
/// but `.` segments
fn is_contained(rel: &Path) -> bool {
    let mut normal = false;
    for component in rel.components() {
        match component {
            Component::Normal(_) => normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    normal
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
