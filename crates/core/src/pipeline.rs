// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline state machine
//!
//! A pipeline is one project's run through an ordered set of stages. All
//! state changes go through [`Pipeline::transition`], a pure function that
//! returns the next pipeline value and the events it produced; persisting the
//! result is the caller's job.

use crate::error::ErrorKind;
use crate::event::Event;
use crate::registry::StageRegistry;
use crate::stage::{FieldMap, StageFailure, StageId, StageRecord, StageStatus};
use crate::validator::ValidationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Collaborator preferences (discipline, language, citation style, ...).
///
/// Stored and handed to collaborators verbatim; never interpreted here.
pub type Preferences = BTreeMap<String, String>;

/// Unique identifier for a pipeline
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(pub String);

impl PipelineId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PipelineId {
    fn from(s: String) -> Self {
        PipelineId(s)
    }
}

impl From<&str> for PipelineId {
    fn from(s: &str) -> Self {
        PipelineId(s.to_string())
    }
}

/// Requested change to a pipeline
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Hand the current stage to its collaborator (also the retry edge)
    Dispatch,
    /// Record collaborator output for the current stage, already validated
    SubmitOutput {
        output: FieldMap,
        result: ValidationResult,
        /// When set, the output answers this dispatch and no other
        expected: Option<Dispatched>,
    },
    /// Record a collaborator error or timeout for the current stage
    Fail {
        failure: StageFailure,
        expected: Option<Dispatched>,
    },
    /// Start mid-sequence, attesting that earlier stages were done elsewhere
    JumpTo {
        target: StageId,
        assume_completed: BTreeSet<StageId>,
        /// Output recorded for attested stages; absent stages get `{}`
        supplied: BTreeMap<StageId, FieldMap>,
    },
    /// Reset `target` and every later stage to pending
    RollbackTo { target: StageId },
}

/// One dispatch of a stage: the stage and its attempt number
///
/// A collaborator's answer carries the dispatch it was produced for, so an
/// answer that arrives after a rollback, jump or re-dispatch is rejected
/// instead of landing on whatever stage is current by then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub stage: StageId,
    pub attempt: u32,
}

/// A transition the pipeline's current state does not allow
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("pipeline {pipeline}: cannot {action} at stage '{stage}': {reason}")]
    InvalidTransition {
        pipeline: PipelineId,
        stage: StageId,
        action: &'static str,
        reason: String,
    },
    #[error("pipeline {pipeline}: unknown stage '{stage}'")]
    UnknownStage { pipeline: PipelineId, stage: StageId },
}

impl TransitionError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidTransition
    }

    pub fn stage(&self) -> &StageId {
        match self {
            TransitionError::InvalidTransition { stage, .. }
            | TransitionError::UnknownStage { stage, .. } => stage,
        }
    }
}

/// One persisted run of the staged workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_stage: StageId,
    /// One record per registry stage, in registry order
    pub stages: Vec<StageRecord>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl Pipeline {
    /// Create a pipeline with every stage pending, positioned at the first stage
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        registry: &StageRegistry,
        preferences: Preferences,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PipelineId(id.into()),
            name: name.into(),
            created_at: now,
            updated_at: now,
            current_stage: registry.first().clone(),
            stages: registry.all().cloned().map(StageRecord::pending).collect(),
            preferences,
        }
    }

    pub fn stage(&self, id: &StageId) -> Option<&StageRecord> {
        self.stages.iter().find(|s| &s.id == id)
    }

    fn stage_mut(&mut self, id: &StageId) -> Option<&mut StageRecord> {
        self.stages.iter_mut().find(|s| &s.id == id)
    }

    /// Record of the current stage
    pub fn current(&self) -> Option<&StageRecord> {
        self.stage(&self.current_stage)
    }

    /// The final stage has completed
    pub fn is_complete(&self) -> bool {
        self.stages
            .last()
            .is_some_and(|last| last.is_completed() && last.id == self.current_stage)
    }

    /// Outputs of every completed stage before the current one, keyed by stage
    pub fn prior_outputs(&self) -> BTreeMap<StageId, FieldMap> {
        self.stages
            .iter()
            .take_while(|s| s.id != self.current_stage)
            .filter(|s| s.is_completed())
            .map(|s| (s.id.clone(), s.output.clone()))
            .collect()
    }

    /// Pure transition function - returns new state and events
    ///
    /// `updated_at` moves only when stage state or the current stage actually
    /// changed, so replaying an idempotent request yields an identical value.
    pub fn transition(
        &self,
        event: PipelineEvent,
        registry: &StageRegistry,
        now: DateTime<Utc>,
    ) -> Result<(Pipeline, Vec<Event>), TransitionError> {
        let (mut pipeline, events) = match event {
            PipelineEvent::Dispatch => self.dispatch()?,
            PipelineEvent::SubmitOutput {
                output,
                result,
                expected,
            } => {
                self.check_dispatched(expected.as_ref(), "advance")?;
                self.submit_output(output, result, registry, now)?
            }
            PipelineEvent::Fail { failure, expected } => {
                self.check_dispatched(expected.as_ref(), "fail")?;
                self.fail(failure)?
            }
            PipelineEvent::JumpTo {
                target,
                assume_completed,
                supplied,
            } => self.jump_to(target, assume_completed, supplied, registry, now)?,
            PipelineEvent::RollbackTo { target } => self.rollback_to(target, registry)?,
        };

        if pipeline.stages != self.stages || pipeline.current_stage != self.current_stage {
            pipeline.updated_at = now;
        }
        Ok((pipeline, events))
    }

    fn current_record(&self) -> Result<&StageRecord, TransitionError> {
        self.current().ok_or_else(|| TransitionError::UnknownStage {
            pipeline: self.id.clone(),
            stage: self.current_stage.clone(),
        })
    }

    fn invalid(&self, stage: &StageId, action: &'static str, reason: impl Into<String>) -> TransitionError {
        TransitionError::InvalidTransition {
            pipeline: self.id.clone(),
            stage: stage.clone(),
            action,
            reason: reason.into(),
        }
    }

    fn index_in(&self, registry: &StageRegistry, stage: &StageId) -> Result<usize, TransitionError> {
        registry
            .index_of(stage)
            .ok_or_else(|| TransitionError::UnknownStage {
                pipeline: self.id.clone(),
                stage: stage.clone(),
            })
    }

    /// The answer must belong to the dispatch that is still in progress
    fn check_dispatched(
        &self,
        expected: Option<&Dispatched>,
        action: &'static str,
    ) -> Result<(), TransitionError> {
        let Some(expected) = expected else {
            return Ok(());
        };
        if self.current_stage != expected.stage {
            return Err(self.invalid(
                &expected.stage,
                action,
                format!(
                    "pipeline moved to stage '{}' while the collaborator ran",
                    self.current_stage
                ),
            ));
        }
        let record = self.current_record()?;
        if record.status != StageStatus::InProgress || record.attempts != expected.attempt {
            return Err(self.invalid(
                &expected.stage,
                action,
                format!(
                    "attempt {} is no longer in progress (stage is {}, attempt {})",
                    expected.attempt, record.status, record.attempts
                ),
            ));
        }
        Ok(())
    }

    fn dispatch(&self) -> Result<(Pipeline, Vec<Event>), TransitionError> {
        let record = self.current_record()?;
        if !record.status.can_dispatch() {
            return Err(self.invalid(
                &record.id,
                "dispatch",
                "stage is already completed; roll back to it to run it again",
            ));
        }

        let mut pipeline = self.clone();
        let stage = pipeline.current_stage.clone();
        let mut attempt = 0;
        if let Some(record) = pipeline.stage_mut(&stage) {
            record.status = StageStatus::InProgress;
            record.error = None;
            record.attempts += 1;
            attempt = record.attempts;
        }

        let events = vec![Event::StageDispatched {
            id: self.id.clone(),
            stage,
            attempt,
        }];
        Ok((pipeline, events))
    }

    fn submit_output(
        &self,
        output: FieldMap,
        result: ValidationResult,
        registry: &StageRegistry,
        now: DateTime<Utc>,
    ) -> Result<(Pipeline, Vec<Event>), TransitionError> {
        let record = self.current_record()?;
        match record.status {
            StageStatus::Completed => {
                return Err(self.invalid(
                    &record.id,
                    "advance",
                    "stage is already completed; roll back to it before submitting new output",
                ))
            }
            StageStatus::Failed => {
                return Err(self.invalid(
                    &record.id,
                    "advance",
                    "stage failed; dispatch it again before submitting new output",
                ))
            }
            StageStatus::Pending | StageStatus::InProgress => {}
        }

        let mut pipeline = self.clone();
        let stage = pipeline.current_stage.clone();
        let mut events = Vec::new();

        if !result.ok {
            let failure = StageFailure::Validation {
                missing: result.missing,
                errors: result.errors,
            };
            if let Some(record) = pipeline.stage_mut(&stage) {
                record.output = output;
                record.status = StageStatus::Failed;
                record.error = Some(failure.clone());
                record.completed_at = None;
            }
            events.push(Event::StageFailed {
                id: self.id.clone(),
                stage,
                failure,
            });
            return Ok((pipeline, events));
        }

        if let Some(record) = pipeline.stage_mut(&stage) {
            record.output = output;
            record.status = StageStatus::Completed;
            record.error = None;
            record.attested = false;
            record.completed_at = Some(now);
        }
        events.push(Event::StageCompleted {
            id: self.id.clone(),
            stage: stage.clone(),
        });

        match registry.next(&stage) {
            Some(next) => {
                pipeline.current_stage = next.clone();
                events.push(Event::StageAdvanced {
                    id: self.id.clone(),
                    from: stage,
                    to: next.clone(),
                });
            }
            None => events.push(Event::PipelineComplete {
                id: self.id.clone(),
            }),
        }
        Ok((pipeline, events))
    }

    fn fail(&self, failure: StageFailure) -> Result<(Pipeline, Vec<Event>), TransitionError> {
        let record = self.current_record()?;
        if !record.status.accepts_output() {
            return Err(self.invalid(
                &record.id,
                "fail",
                format!("stage is {}, not pending or in progress", record.status),
            ));
        }

        let mut pipeline = self.clone();
        let stage = pipeline.current_stage.clone();
        if let Some(record) = pipeline.stage_mut(&stage) {
            record.status = StageStatus::Failed;
            record.error = Some(failure.clone());
        }
        let events = vec![Event::StageFailed {
            id: self.id.clone(),
            stage,
            failure,
        }];
        Ok((pipeline, events))
    }

    fn jump_to(
        &self,
        target: StageId,
        assume_completed: BTreeSet<StageId>,
        supplied: BTreeMap<StageId, FieldMap>,
        registry: &StageRegistry,
        now: DateTime<Utc>,
    ) -> Result<(Pipeline, Vec<Event>), TransitionError> {
        let target_idx = self.index_in(registry, &target)?;

        for stage in &assume_completed {
            let idx = self.index_in(registry, stage)?;
            if idx >= target_idx {
                return Err(self.invalid(
                    &target,
                    "jump",
                    format!(
                        "'{}' is at or after the target and cannot be assumed completed",
                        stage
                    ),
                ));
            }
        }
        if let Some(stage) = supplied.keys().find(|s| !assume_completed.contains(*s)) {
            return Err(self.invalid(
                &target,
                "jump",
                format!("output supplied for '{}', which is not assumed completed", stage),
            ));
        }

        // No silent gaps: every earlier stage is either attested now or already done
        for stage in registry.all().take(target_idx) {
            let done = self.stage(stage).is_some_and(|r| r.is_completed());
            if !done && !assume_completed.contains(stage) {
                return Err(self.invalid(
                    &target,
                    "jump",
                    format!(
                        "'{}' precedes the target but is neither completed nor assumed completed",
                        stage
                    ),
                ));
            }
        }

        let mut pipeline = self.clone();
        let mut supplied = supplied;
        let mut assumed = Vec::new();
        for (idx, stage) in registry.all().enumerate() {
            let Some(record) = pipeline.stage_mut(stage) else {
                continue;
            };
            if idx >= target_idx {
                record.reset();
                continue;
            }
            if !assume_completed.contains(stage) {
                continue;
            }
            match supplied.remove(stage) {
                Some(output) => record.output = output,
                // Tracked output from an earlier run is kept
                None if record.is_completed() => continue,
                None => record.output = FieldMap::new(),
            }
            record.status = StageStatus::Completed;
            record.error = None;
            record.attested = true;
            record.completed_at = Some(now);
            assumed.push(stage.clone());
        }
        pipeline.current_stage = target.clone();

        let events = vec![Event::PipelineJumped {
            id: self.id.clone(),
            target,
            assumed,
        }];
        Ok((pipeline, events))
    }

    fn rollback_to(
        &self,
        target: StageId,
        registry: &StageRegistry,
    ) -> Result<(Pipeline, Vec<Event>), TransitionError> {
        let target_idx = self.index_in(registry, &target)?;
        let current_idx = self.index_in(registry, &self.current_stage)?;
        if target_idx > current_idx {
            return Err(self.invalid(
                &target,
                "roll back",
                format!(
                    "target is after the current stage '{}'; rollback only moves backwards",
                    self.current_stage
                ),
            ));
        }

        let mut pipeline = self.clone();
        let mut reset = Vec::new();
        for stage in registry.all().skip(target_idx) {
            if let Some(record) = pipeline.stage_mut(stage) {
                if *record != StageRecord::pending(stage.clone()) {
                    reset.push(stage.clone());
                }
                record.reset();
            }
        }
        pipeline.current_stage = target.clone();

        let events = if reset.is_empty() && self.current_stage == target {
            Vec::new()
        } else {
            vec![Event::PipelineRolledBack {
                id: self.id.clone(),
                target,
                reset,
            }]
        };
        Ok((pipeline, events))
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
