// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error classification shared across crates

use serde::{Deserialize, Serialize};

/// Stable classification of every failure the orchestrator can report.
///
/// Each error type in the workspace exposes a `kind()` accessor returning one
/// of these; wrapping an error in more context never changes its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown pipeline id
    NotFound,
    /// Requested transition violates ordering or status invariants
    InvalidTransition,
    /// Stage output is missing required fields or is malformed
    ValidationFailed,
    /// The external collaborator reported an error
    CollaboratorError,
    /// The external collaborator did not answer in time
    CollaboratorTimeout,
    /// Persistence layer could not read or write
    Io,
    /// Stored data is unreadable or does not match the registry
    CorruptRecord,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::CollaboratorError => "collaborator_error",
            ErrorKind::CollaboratorTimeout => "collaborator_timeout",
            ErrorKind::Io => "io",
            ErrorKind::CorruptRecord => "corrupt_record",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
