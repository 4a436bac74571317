// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events produced by pipeline transitions

use crate::pipeline::PipelineId;
use crate::stage::{StageFailure, StageId};
use serde::{Deserialize, Serialize};

/// Something observable that happened to a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PipelineCreated {
        id: PipelineId,
        stage: StageId,
    },
    StageDispatched {
        id: PipelineId,
        stage: StageId,
        attempt: u32,
    },
    StageCompleted {
        id: PipelineId,
        stage: StageId,
    },
    StageFailed {
        id: PipelineId,
        stage: StageId,
        failure: StageFailure,
    },
    StageAdvanced {
        id: PipelineId,
        from: StageId,
        to: StageId,
    },
    PipelineComplete {
        id: PipelineId,
    },
    PipelineJumped {
        id: PipelineId,
        target: StageId,
        assumed: Vec<StageId>,
    },
    PipelineRolledBack {
        id: PipelineId,
        target: StageId,
        reset: Vec<StageId>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::PipelineCreated { .. } => "pipeline:created",
            Event::StageDispatched { .. } => "stage:dispatched",
            Event::StageCompleted { .. } => "stage:completed",
            Event::StageFailed { .. } => "stage:failed",
            Event::StageAdvanced { .. } => "stage:advanced",
            Event::PipelineComplete { .. } => "pipeline:complete",
            Event::PipelineJumped { .. } => "pipeline:jumped",
            Event::PipelineRolledBack { .. } => "pipeline:rolled_back",
        }
    }

    pub fn pipeline_id(&self) -> &PipelineId {
        match self {
            Event::PipelineCreated { id, .. }
            | Event::StageDispatched { id, .. }
            | Event::StageCompleted { id, .. }
            | Event::StageFailed { id, .. }
            | Event::StageAdvanced { id, .. }
            | Event::PipelineComplete { id }
            | Event::PipelineJumped { id, .. }
            | Event::PipelineRolledBack { id, .. } => id,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::PipelineCreated { id, stage } => write!(f, "{} created at {}", id, stage),
            Event::StageDispatched { id, stage, attempt } => {
                write!(f, "{} dispatched {} (attempt {})", id, stage, attempt)
            }
            Event::StageCompleted { id, stage } => write!(f, "{} completed {}", id, stage),
            Event::StageFailed { id, stage, failure } => {
                write!(f, "{} failed {}: {}", id, stage, failure)
            }
            Event::StageAdvanced { id, from, to } => write!(f, "{} advanced {} -> {}", id, from, to),
            Event::PipelineComplete { id } => write!(f, "{} complete", id),
            Event::PipelineJumped { id, target, .. } => write!(f, "{} jumped to {}", id, target),
            Event::PipelineRolledBack { id, target, .. } => {
                write!(f, "{} rolled back to {}", id, target)
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
