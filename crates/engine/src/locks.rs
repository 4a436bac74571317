// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pipeline mutual exclusion within one process

use pf_core::PipelineId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One mutex per pipeline id
///
/// Operations on different pipelines never contend; operations on the same
/// pipeline run one at a time. Entries live only while some caller holds
/// a handle, so the table does not grow with every id ever touched.
#[derive(Debug, Clone, Default)]
pub struct PipelineLocks {
    locks: Arc<Mutex<HashMap<PipelineId, Arc<Mutex<()>>>>>,
}

impl PipelineLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `id`, created on first use
    pub fn handle(&self, id: &PipelineId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    /// Forget the mutex for `id` once no caller holds its handle
    ///
    /// Handles are only handed out under the table lock, so a count of one
    /// (the table's own reference) means nobody can be waiting on it.
    pub fn release(&self, id: &PipelineId) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.get(id).is_some_and(|m| Arc::strong_count(m) == 1) {
            locks.remove(id);
        }
    }

    /// Number of pipelines with a live mutex
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
