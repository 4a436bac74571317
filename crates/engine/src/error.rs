// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordinator

use pf_core::{ErrorKind, PipelineId, StageId, TransitionError, ValidationResult};
use pf_storage::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`crate::Coordinator`] operations
///
/// Lower-layer errors keep their kind; the coordinator only adds which
/// pipeline and stage were active.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("{}{source}", context(.pipeline, .stage.as_ref()))]
    Store {
        pipeline: PipelineId,
        stage: Option<StageId>,
        #[source]
        source: StoreError,
    },
    #[error("pipeline not found: {pipeline}")]
    NotFound { pipeline: PipelineId },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("pipeline {pipeline} does not match the stage registry: {reason}")]
    RegistryMismatch { pipeline: PipelineId, reason: String },
    #[error("pipeline {pipeline}: stage '{stage}' output failed validation ({result})")]
    ValidationFailed {
        pipeline: PipelineId,
        stage: StageId,
        result: ValidationResult,
    },
    #[error("pipeline {pipeline}: collaborator for stage '{stage}' failed: {message}")]
    Collaborator {
        pipeline: PipelineId,
        stage: StageId,
        message: String,
    },
    #[error("pipeline {pipeline}: collaborator for stage '{stage}' timed out after {}", format_after(.after))]
    Timeout {
        pipeline: PipelineId,
        stage: StageId,
        after: Duration,
    },
    #[error("could not allocate an unused pipeline id for '{name}'")]
    IdExhausted { name: String },
}

fn format_after(after: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*after)
}

fn context(pipeline: &PipelineId, stage: Option<&StageId>) -> String {
    match stage {
        Some(stage) => format!("pipeline {} at stage '{}': ", pipeline, stage),
        None => format!("pipeline {}: ", pipeline),
    }
}

impl CoordinatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::NotFound { .. } => ErrorKind::NotFound,
            CoordinatorError::Store { source, .. } => source.kind(),
            CoordinatorError::Transition(e) => e.kind(),
            CoordinatorError::RegistryMismatch { .. } => ErrorKind::CorruptRecord,
            CoordinatorError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            CoordinatorError::Collaborator { .. } => ErrorKind::CollaboratorError,
            CoordinatorError::Timeout { .. } => ErrorKind::CollaboratorTimeout,
            CoordinatorError::IdExhausted { .. } => ErrorKind::Io,
        }
    }

    /// Pipeline the failure concerns, when known
    pub fn pipeline(&self) -> Option<&PipelineId> {
        match self {
            CoordinatorError::NotFound { pipeline }
            | CoordinatorError::Store { pipeline, .. }
            | CoordinatorError::RegistryMismatch { pipeline, .. }
            | CoordinatorError::ValidationFailed { pipeline, .. }
            | CoordinatorError::Collaborator { pipeline, .. }
            | CoordinatorError::Timeout { pipeline, .. } => Some(pipeline),
            CoordinatorError::Transition(
                TransitionError::InvalidTransition { pipeline, .. }
                | TransitionError::UnknownStage { pipeline, .. },
            ) => Some(pipeline),
            CoordinatorError::IdExhausted { .. } => None,
        }
    }

    /// Stage that was active, when known
    pub fn stage(&self) -> Option<&StageId> {
        match self {
            CoordinatorError::Store { stage, .. } => stage.as_ref(),
            CoordinatorError::Transition(e) => Some(e.stage()),
            CoordinatorError::ValidationFailed { stage, .. }
            | CoordinatorError::Collaborator { stage, .. }
            | CoordinatorError::Timeout { stage, .. } => Some(stage),
            CoordinatorError::NotFound { .. }
            | CoordinatorError::RegistryMismatch { .. }
            | CoordinatorError::IdExhausted { .. } => None,
        }
    }

    pub(crate) fn store(pipeline: &PipelineId, stage: Option<&StageId>, source: StoreError) -> Self {
        if let StoreError::NotFound { id } = source {
            return CoordinatorError::NotFound { pipeline: id };
        }
        CoordinatorError::Store {
            pipeline: pipeline.clone(),
            stage: stage.cloned(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
