// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage errors

use pf_core::{ErrorKind, PipelineId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or writing pipeline records
///
/// `Io` means the write (or read) can be retried; `Corrupt` and
/// `UnsupportedVersion` mean the stored data cannot be used as-is.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pipeline not found: {id}")]
    NotFound { id: PipelineId },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt record for pipeline {id}: {reason}")]
    Corrupt { id: PipelineId, reason: String },
    #[error("record for pipeline {id} has schema version {found}, newer than supported version {supported}")]
    UnsupportedVersion {
        id: PipelineId,
        found: u64,
        supported: u32,
    },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Io { .. } => ErrorKind::Io,
            StoreError::Corrupt { .. } | StoreError::UnsupportedVersion { .. } => {
                ErrorKind::CorruptRecord
            }
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(id: &PipelineId, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}
