// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline coordinator
//!
//! Every mutating operation is load -> pure transition -> save, run while
//! holding the pipeline's in-process mutex and the store's lock. The
//! collaborator call in [`Coordinator::run_stage`] happens outside both.

use crate::error::CoordinatorError;
use crate::locks::PipelineLocks;
use pf_core::{
    Clock, Dispatched, Event, FieldMap, IdGen, Pipeline, PipelineEvent, PipelineId, Preferences,
    StageAdapter, StageFailure, StageId, StageInput, StageRegistry, StageValidator,
    ValidationResult,
};
use pf_storage::ContextStore;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Attempts at finding an unused id before giving up
const MAX_ID_ATTEMPTS: usize = 16;

/// Result of submitting output for a stage
#[derive(Debug, Clone)]
pub struct Advance {
    /// Stage the output was recorded against
    pub stage: StageId,
    pub result: ValidationResult,
    /// Pipeline after the transition
    pub pipeline: Pipeline,
}

impl Advance {
    pub fn passed(&self) -> bool {
        self.result.ok
    }

    /// Turn a failed validation into [`CoordinatorError::ValidationFailed`]
    pub fn into_checked(self) -> Result<Advance, CoordinatorError> {
        if self.result.ok {
            return Ok(self);
        }
        Err(CoordinatorError::ValidationFailed {
            pipeline: self.pipeline.id,
            stage: self.stage,
            result: self.result,
        })
    }
}

/// Drives pipelines through their stages
pub struct Coordinator<S, C, I> {
    store: S,
    registry: StageRegistry,
    clock: C,
    id_gen: I,
    locks: PipelineLocks,
}

impl<S, C, I> Coordinator<S, C, I>
where
    S: ContextStore,
    C: Clock,
    I: IdGen,
{
    pub fn new(store: S, registry: StageRegistry, clock: C, id_gen: I) -> Self {
        Self {
            store,
            registry,
            clock,
            id_gen,
            locks: PipelineLocks::new(),
        }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a pipeline with every stage pending
    pub fn init(&self, name: &str, preferences: Preferences) -> Result<Pipeline, CoordinatorError> {
        let id = self.fresh_id(name)?;
        let pipeline = self.locked(&id, || {
            let pipeline =
                Pipeline::new(id.0.clone(), name, &self.registry, preferences, self.clock.now());
            self.store
                .save(&pipeline)
                .map_err(|e| CoordinatorError::store(&pipeline.id, None, e))?;
            Ok(pipeline)
        })?;

        emit(&[Event::PipelineCreated {
            id: pipeline.id.clone(),
            stage: pipeline.current_stage.clone(),
        }]);
        Ok(pipeline)
    }

    fn fresh_id(&self, name: &str) -> Result<PipelineId, CoordinatorError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = PipelineId::from(self.id_gen.next(name));
            if !self.store.exists(&id) {
                return Ok(id);
            }
            tracing::debug!(pipeline = %id, "generated id already in use");
        }
        Err(CoordinatorError::IdExhausted {
            name: name.to_string(),
        })
    }

    /// Read-only snapshot of a pipeline
    pub fn status(&self, id: &PipelineId) -> Result<Pipeline, CoordinatorError> {
        self.load(id)
    }

    /// Ids of every stored pipeline
    pub fn list(&self) -> Result<Vec<PipelineId>, CoordinatorError> {
        self.store
            .list()
            .map_err(|e| CoordinatorError::store(&PipelineId::from("*"), None, e))
    }

    /// Hand the current stage to its collaborator
    ///
    /// Moves the stage to `in_progress` (the retry edge for a failed stage)
    /// and returns the input the collaborator should receive.
    pub fn dispatch(&self, id: &PipelineId) -> Result<StageInput, CoordinatorError> {
        self.dispatch_attempt(id).map(|(input, _)| input)
    }

    fn dispatch_attempt(&self, id: &PipelineId) -> Result<(StageInput, Dispatched), CoordinatorError> {
        let (pipeline, _) = self.apply(id, |_| Ok(PipelineEvent::Dispatch))?;
        let attempt = pipeline.current().map_or(0, |r| r.attempts);
        let dispatched = Dispatched {
            stage: pipeline.current_stage.clone(),
            attempt,
        };
        Ok((StageInput::for_current(&pipeline), dispatched))
    }

    /// Validate and record output for the current stage
    ///
    /// A failed validation is not an error here: the output and the missing
    /// fields are recorded, the stage is `failed`, and the result says why.
    pub fn advance(&self, id: &PipelineId, output: FieldMap) -> Result<Advance, CoordinatorError> {
        self.submit(id, output, None)
    }

    fn submit(
        &self,
        id: &PipelineId,
        output: FieldMap,
        expected: Option<Dispatched>,
    ) -> Result<Advance, CoordinatorError> {
        let mut stage = None;
        let mut result = None;
        let (pipeline, _) = self.apply(id, |pipeline| {
            let validation = StageValidator::new(&self.registry)
                .validate(&pipeline.current_stage, &output)
                .map_err(|e| CoordinatorError::RegistryMismatch {
                    pipeline: pipeline.id.clone(),
                    reason: e.to_string(),
                })?;
            stage = Some(pipeline.current_stage.clone());
            result = Some(validation.clone());
            Ok(PipelineEvent::SubmitOutput {
                output,
                result: validation,
                expected,
            })
        })?;

        let stage = stage.unwrap_or_else(|| pipeline.current_stage.clone());
        let result = result.unwrap_or_else(ValidationResult::passed);
        if !result.ok {
            tracing::warn!(pipeline = %pipeline.id, stage = %stage, %result, "stage output rejected");
        }
        Ok(Advance {
            stage,
            result,
            pipeline,
        })
    }

    /// Record a collaborator failure against the current stage
    pub fn fail(&self, id: &PipelineId, failure: StageFailure) -> Result<Pipeline, CoordinatorError> {
        let (pipeline, _) = self.apply(id, |_| {
            Ok(PipelineEvent::Fail {
                failure,
                expected: None,
            })
        })?;
        Ok(pipeline)
    }

    /// Start mid-sequence at `target`
    ///
    /// Every stage before `target` must be in `assume_completed` or already
    /// completed. `supplied` may carry output for assumed stages.
    pub fn jump_to(
        &self,
        id: &PipelineId,
        target: StageId,
        assume_completed: BTreeSet<StageId>,
        supplied: BTreeMap<StageId, FieldMap>,
    ) -> Result<Pipeline, CoordinatorError> {
        let (pipeline, _) = self.apply(id, |_| {
            Ok(PipelineEvent::JumpTo {
                target,
                assume_completed,
                supplied,
            })
        })?;
        Ok(pipeline)
    }

    /// Reset `target` and every later stage to pending
    pub fn rollback_to(&self, id: &PipelineId, target: StageId) -> Result<Pipeline, CoordinatorError> {
        let (pipeline, _) = self.apply(id, |_| Ok(PipelineEvent::RollbackTo { target }))?;
        Ok(pipeline)
    }

    /// Re-validate every stage with recorded output
    pub fn validate(&self, id: &PipelineId) -> Result<BTreeMap<StageId, ValidationResult>, CoordinatorError> {
        let pipeline = self.load(id)?;
        Ok(StageValidator::new(&self.registry).validate_all(&pipeline))
    }

    /// Dispatch the current stage, run its collaborator, record the outcome
    ///
    /// The collaborator runs without any lock held. Its answer is recorded
    /// only if the same attempt is still in progress when it arrives; a
    /// rollback, jump or re-dispatch in the meantime turns it into an
    /// `InvalidTransition`. A collaborator error or timeout is recorded as a
    /// failed stage and returned as an error.
    pub async fn run_stage<A>(
        &self,
        id: &PipelineId,
        adapter: &A,
        timeout: Option<Duration>,
    ) -> Result<Advance, CoordinatorError>
    where
        A: StageAdapter + ?Sized,
    {
        let (input, dispatched) = self.dispatch_attempt(id)?;
        let stage = input.stage.clone();

        let outcome = match timeout {
            Some(after) => match tokio::time::timeout(after, adapter.run(&input)).await {
                Ok(result) => result.map_err(|e| StageFailure::Collaborator { message: e.message }),
                Err(_) => Err(StageFailure::Timeout { after }),
            },
            None => adapter
                .run(&input)
                .await
                .map_err(|e| StageFailure::Collaborator { message: e.message }),
        };

        match outcome {
            Ok(output) => self.submit(id, output.fields, Some(dispatched)),
            Err(failure) => {
                let err = match &failure {
                    StageFailure::Timeout { after } => CoordinatorError::Timeout {
                        pipeline: id.clone(),
                        stage: stage.clone(),
                        after: *after,
                    },
                    StageFailure::Collaborator { message } => CoordinatorError::Collaborator {
                        pipeline: id.clone(),
                        stage: stage.clone(),
                        message: message.clone(),
                    },
                    StageFailure::Validation { .. } => CoordinatorError::Collaborator {
                        pipeline: id.clone(),
                        stage: stage.clone(),
                        message: failure.to_string(),
                    },
                };
                self.apply(id, |_| {
                    Ok(PipelineEvent::Fail {
                        failure,
                        expected: Some(dispatched),
                    })
                })?;
                Err(err)
            }
        }
    }

    fn load(&self, id: &PipelineId) -> Result<Pipeline, CoordinatorError> {
        let pipeline = self
            .store
            .load(id)
            .map_err(|e| CoordinatorError::store(id, None, e))?;
        self.registry
            .check(&pipeline)
            .map_err(|e| CoordinatorError::RegistryMismatch {
                pipeline: id.clone(),
                reason: e.to_string(),
            })?;
        Ok(pipeline)
    }

    /// Load, transition and save under the pipeline's locks
    ///
    /// The record is rewritten only when the transition changed it.
    fn apply<F>(&self, id: &PipelineId, event: F) -> Result<(Pipeline, Vec<Event>), CoordinatorError>
    where
        F: FnOnce(&Pipeline) -> Result<PipelineEvent, CoordinatorError>,
    {
        // Unlocked read first: a missing or unreadable record fails with the
        // store's own kind before any lock file is created for it
        self.load(id)?;

        self.locked(id, || {
            let pipeline = self.load(id)?;
            let event = event(&pipeline)?;
            let (next, events) = pipeline.transition(event, &self.registry, self.clock.now())?;

            if next != pipeline {
                self.store
                    .save(&next)
                    .map_err(|e| CoordinatorError::store(id, Some(&pipeline.current_stage), e))?;
            }
            emit(&events);
            Ok((next, events))
        })
    }

    /// Run `f` holding the pipeline's in-process mutex and the store's lock
    fn locked<T>(
        &self,
        id: &PipelineId,
        f: impl FnOnce() -> Result<T, CoordinatorError>,
    ) -> Result<T, CoordinatorError> {
        let handle = self.locks.handle(id);
        let result = {
            let _local = handle.lock().unwrap_or_else(|e| e.into_inner());
            match self.store.lock(id) {
                Ok(_stored) => f(),
                Err(e) => Err(CoordinatorError::store(id, None, e)),
            }
        };
        drop(handle);
        self.locks.release(id);
        result
    }
}

fn emit(events: &[Event]) {
    for event in events {
        tracing::info!(event = event.name(), pipeline = %event.pipeline_id(), "{}", event);
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
