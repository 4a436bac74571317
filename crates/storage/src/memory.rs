// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory storage for tests and embedding

use crate::document::{decode, encode};
use crate::error::StoreError;
use crate::store::{ContextStore, StoreLock};
use pf_core::{Pipeline, PipelineId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Keeps encoded documents in a shared map
///
/// Records go through the same encoding as [`crate::JsonStore`], so a
/// pipeline that round-trips here round-trips on disk too.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<BTreeMap<PipelineId, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw document text under `id`, bypassing encoding
    pub fn insert_raw(&self, id: impl Into<PipelineId>, text: impl Into<String>) {
        self.records().insert(id.into(), text.into());
    }

    /// Raw document text stored under `id`
    pub fn raw(&self, id: &PipelineId) -> Option<String> {
        self.records().get(id).cloned()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, BTreeMap<PipelineId, String>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ContextStore for MemoryStore {
    fn load(&self, id: &PipelineId) -> Result<Pipeline, StoreError> {
        let text = self
            .raw(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        decode(id, &text)
    }

    fn save(&self, pipeline: &Pipeline) -> Result<(), StoreError> {
        let text = encode(pipeline)
            .map_err(|e| StoreError::corrupt(&pipeline.id, format!("cannot encode: {}", e)))?;
        self.records().insert(pipeline.id.clone(), text);
        Ok(())
    }

    fn exists(&self, id: &PipelineId) -> bool {
        self.records().contains_key(id)
    }

    fn list(&self) -> Result<Vec<PipelineId>, StoreError> {
        Ok(self.records().keys().cloned().collect())
    }

    fn delete(&self, id: &PipelineId) -> Result<(), StoreError> {
        self.records()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })
    }

    fn lock(&self, _id: &PipelineId) -> Result<StoreLock, StoreError> {
        Ok(StoreLock::unlocked())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
