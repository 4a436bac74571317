// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-based storage
//!
//! Layout under the base directory:
//!
//! ```text
//! <id>.json   versioned pipeline document
//! <id>.lock   advisory lock file
//! ```

use crate::document::{decode, encode};
use crate::error::StoreError;
use crate::store::{ContextStore, StoreLock};
use fs2::FileExt;
use pf_core::{Pipeline, PipelineId};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One JSON document per pipeline in a directory
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_path: PathBuf,
}

impl JsonStore {
    /// Open a store at the given path, creating the directory if needed
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| StoreError::io(&base_path, e))?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of a pipeline's document
    pub fn path_for(&self, id: &PipelineId) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    fn lock_path(&self, id: &PipelineId) -> PathBuf {
        self.base_path.join(format!("{}.lock", id))
    }

    fn temp_path(&self, id: &PipelineId) -> PathBuf {
        self.base_path.join(format!(".{}.json.tmp", id))
    }
}

/// Ids become file names; anything that could leave the directory is rejected
fn is_safe_id(id: &PipelineId) -> bool {
    let id = id.as_str();
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn unsafe_id(id: &PipelineId) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("pipeline id '{}' is not a valid file name", id),
    )
}

impl ContextStore for JsonStore {
    fn load(&self, id: &PipelineId) -> Result<Pipeline, StoreError> {
        if !is_safe_id(id) {
            return Err(StoreError::NotFound { id: id.clone() });
        }
        let path = self.path_for(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id: id.clone() })
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };
        decode(id, &text).inspect_err(|e| {
            tracing::warn!(pipeline = %id, path = %path.display(), error = %e, "unreadable record");
        })
    }

    fn save(&self, pipeline: &Pipeline) -> Result<(), StoreError> {
        let id = &pipeline.id;
        let path = self.path_for(id);
        if !is_safe_id(id) {
            return Err(StoreError::io(path, unsafe_id(id)));
        }
        let text = encode(pipeline).map_err(|e| StoreError::io(&path, e.into()))?;

        // Write temp, fsync, rename over the target
        let tmp = self.temp_path(id);
        let write = || -> io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io(tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io(path, e));
        }

        // Persist the rename itself; not every platform can open a directory
        if let Ok(dir) = File::open(&self.base_path) {
            let _ = dir.sync_all();
        }
        tracing::debug!(pipeline = %id, path = %path.display(), "saved pipeline");
        Ok(())
    }

    fn exists(&self, id: &PipelineId) -> bool {
        is_safe_id(id) && self.path_for(id).is_file()
    }

    fn list(&self) -> Result<Vec<PipelineId>, StoreError> {
        let entries =
            fs::read_dir(&self.base_path).map_err(|e| StoreError::io(&self.base_path, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.base_path, e))?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !stem.starts_with('.') {
                        ids.push(PipelineId::from(stem));
                    }
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, id: &PipelineId) -> Result<(), StoreError> {
        if !self.exists(id) {
            return Err(StoreError::NotFound { id: id.clone() });
        }
        let path = self.path_for(id);
        fs::remove_file(&path).map_err(|e| StoreError::io(path, e))?;
        let _ = fs::remove_file(self.lock_path(id));
        Ok(())
    }

    fn lock(&self, id: &PipelineId) -> Result<StoreLock, StoreError> {
        let path = self.lock_path(id);
        if !is_safe_id(id) {
            return Err(StoreError::io(path, unsafe_id(id)));
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.lock_exclusive().map_err(|e| StoreError::io(&path, e))?;
        Ok(StoreLock::file(file))
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
