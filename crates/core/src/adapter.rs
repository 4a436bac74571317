// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator boundary
//!
//! A collaborator performs one stage's actual work (searching literature,
//! drafting a manuscript, ...). The coordinator hands it a [`StageInput`] and
//! records whatever [`StageOutput`] or [`CollaboratorError`] comes back.

use crate::pipeline::{Pipeline, PipelineId, Preferences};
use crate::stage::{FieldMap, StageId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Everything a collaborator is given for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInput {
    pub pipeline_id: PipelineId,
    pub stage: StageId,
    /// Outputs of the completed stages before `stage`
    pub prior_outputs: BTreeMap<StageId, FieldMap>,
    pub preferences: Preferences,
}

impl StageInput {
    /// Input for the pipeline's current stage
    pub fn for_current(pipeline: &Pipeline) -> Self {
        Self {
            pipeline_id: pipeline.id.clone(),
            stage: pipeline.current_stage.clone(),
            prior_outputs: pipeline.prior_outputs(),
            preferences: pipeline.preferences.clone(),
        }
    }
}

/// Fields produced by a collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    #[serde(default)]
    pub fields: FieldMap,
}

impl StageOutput {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }
}

/// The collaborator could not produce output
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Something that performs a stage's work
///
/// Implementations must tolerate being called again with the same input
/// after a failure, and must not depend on mutating `input`.
#[async_trait]
pub trait StageAdapter: Send + Sync {
    async fn run(&self, input: &StageInput) -> Result<StageOutput, CollaboratorError>;
}

#[async_trait]
impl<A: StageAdapter + ?Sized> StageAdapter for std::sync::Arc<A> {
    async fn run(&self, input: &StageInput) -> Result<StageOutput, CollaboratorError> {
        (**self).run(input).await
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
