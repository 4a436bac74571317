// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation abstractions

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates unique pipeline identifiers
///
/// `name` is the human-readable pipeline name; generators may use it to make
/// ids easier to type, but uniqueness must not depend on it.
pub trait IdGen: Clone + Send + Sync {
    fn next(&self, name: &str) -> String;
}

/// UUID-based ID generator
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self, _name: &str) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Name-derived ID generator: `<slug>-<8 hex chars>`
#[derive(Clone, Default)]
pub struct SlugIdGen;

impl IdGen for SlugIdGen {
    fn next(&self, name: &str) -> String {
        let slug: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        let slug = slug.trim_matches('-');
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        if slug.is_empty() {
            suffix[..8].to_string()
        } else {
            format!("{}-{}", slug, &suffix[..8])
        }
    }
}

/// Sequential ID generator for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("pipeline")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self, _name: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
