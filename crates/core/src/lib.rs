// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pf-core: Core library for the Paperflow (pf) stage orchestrator
//!
//! This crate provides:
//! - The stage registry and output validator
//! - A pure pipeline state machine (`Pipeline::transition`)
//! - The collaborator adapter trait
//! - The built-in paper writing workflow

pub mod adapter;
pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod paper;
pub mod pipeline;
pub mod registry;
pub mod stage;
pub mod validator;

pub use adapter::{CollaboratorError, StageAdapter, StageInput, StageOutput};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::ErrorKind;
pub use event::Event;
pub use id::{IdGen, SequentialIdGen, SlugIdGen, UuidIdGen};
pub use paper::PaperPayload;
pub use pipeline::{Dispatched, Pipeline, PipelineEvent, PipelineId, Preferences, TransitionError};
pub use registry::{FieldRule, FieldType, RegistryError, StageDef, StageRegistry};
pub use stage::{FieldMap, StageFailure, StageId, StageRecord, StageStatus};
pub use validator::{StageValidator, ValidationResult};
