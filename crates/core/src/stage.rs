// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stage records
//!
//! A pipeline holds one [`StageRecord`] for every stage in its registry. The
//! record's status follows
//! `pending -> in_progress -> completed | failed`, with `failed -> in_progress`
//! on retry and any status back to `pending` on rollback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Stage output: field name to JSON value
pub type FieldMap = BTreeMap<String, serde_json::Value>;

/// Identifier of a stage within a registry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub String);

impl StageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StageId {
    fn from(s: &str) -> Self {
        StageId(s.to_string())
    }
}

impl From<String> for StageId {
    fn from(s: String) -> Self {
        StageId(s)
    }
}

/// Status of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StageStatus {
    pub fn name(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::InProgress => "in_progress",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        }
    }

    /// Statuses from which a stage's output may be submitted
    pub fn accepts_output(&self) -> bool {
        matches!(self, StageStatus::Pending | StageStatus::InProgress)
    }

    /// Statuses from which a stage may be handed to a collaborator
    pub fn can_dispatch(&self) -> bool {
        !matches!(self, StageStatus::Completed)
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why a stage ended up `failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageFailure {
    /// Output did not satisfy the stage's field rules
    Validation {
        missing: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
    },
    /// The collaborator returned an error
    Collaborator { message: String },
    /// The collaborator did not answer within the caller's deadline
    Timeout {
        #[serde(with = "humantime_serde")]
        after: Duration,
    },
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageFailure::Validation { missing, errors } => {
                write!(f, "validation failed")?;
                if !missing.is_empty() {
                    write!(f, "; missing: {}", missing.join(", "))?;
                }
                if !errors.is_empty() {
                    write!(f, "; {}", errors.join("; "))?;
                }
                Ok(())
            }
            StageFailure::Collaborator { message } => write!(f, "collaborator error: {}", message),
            StageFailure::Timeout { after } => {
                write!(f, "collaborator timed out after {}", humantime::format_duration(*after))
            }
        }
    }
}

/// Recorded state of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: StageId,
    pub status: StageStatus,
    #[serde(default)]
    pub output: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StageFailure>,
    /// Dispatches since the stage was last reset
    #[serde(default)]
    pub attempts: u32,
    /// Completed by attestation (jump) rather than by validated output
    #[serde(default)]
    pub attested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StageRecord {
    pub fn pending(id: StageId) -> Self {
        Self {
            id,
            status: StageStatus::Pending,
            output: FieldMap::new(),
            error: None,
            attempts: 0,
            attested: false,
            completed_at: None,
        }
    }

    /// Reset to a freshly created pending record
    pub fn reset(&mut self) {
        *self = StageRecord::pending(self.id.clone());
    }

    pub fn is_completed(&self) -> bool {
        self.status == StageStatus::Completed
    }
}
