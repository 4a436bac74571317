// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage trait

use crate::error::StoreError;
use fs2::FileExt;
use pf_core::{Pipeline, PipelineId};
use std::fs::File;

/// Persistent storage for pipeline records
///
/// Stores never validate or repair what they hold: a record that cannot be
/// read back is reported, not rewritten.
pub trait ContextStore: Send + Sync {
    /// Load a pipeline, `NotFound` when no record exists
    fn load(&self, id: &PipelineId) -> Result<Pipeline, StoreError>;

    /// Replace the pipeline's record; either fully succeeds or leaves the
    /// previous record in place
    fn save(&self, pipeline: &Pipeline) -> Result<(), StoreError>;

    fn exists(&self, id: &PipelineId) -> bool;

    /// All stored pipeline ids, sorted
    fn list(&self) -> Result<Vec<PipelineId>, StoreError>;

    fn delete(&self, id: &PipelineId) -> Result<(), StoreError>;

    /// Exclusive lock on one pipeline's record, held until the guard drops
    fn lock(&self, id: &PipelineId) -> Result<StoreLock, StoreError>;
}

/// Guard returned by [`ContextStore::lock`]
#[derive(Debug)]
pub struct StoreLock {
    file: Option<File>,
}

impl StoreLock {
    /// A guard for stores that need no cross-process lock
    pub fn unlocked() -> Self {
        Self { file: None }
    }

    pub(crate) fn file(file: File) -> Self {
        Self { file: Some(file) }
    }

    pub fn is_file_lock(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}
