// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands that move a pipeline between stages

use super::{parse_fields, read_fields, App};
use crate::error::PfError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::{ArgGroup, Args};
use pf_adapters::{CommandAdapter, TracedAdapter};
use pf_core::{FieldMap, Pipeline, PipelineId, StageFailure, StageId, ValidationResult};
use pf_engine::Advance;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["output", "output_file"])))]
pub struct AdvanceArgs {
    /// Pipeline id
    pub id: PipelineId,

    /// Stage output as a JSON object
    #[arg(long)]
    pub output: Option<String>,

    /// File holding the stage output JSON object
    #[arg(long)]
    pub output_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline id
    pub id: PipelineId,

    /// Give up on the collaborator after this long (e.g. 90s, 15m)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

#[derive(Args, Debug)]
pub struct JumpArgs {
    /// Pipeline id
    pub id: PipelineId,

    /// Stage to start from
    pub stage: StageId,

    /// Stage before the target to treat as completed (repeatable)
    #[arg(long = "assume")]
    pub assume: Vec<StageId>,

    /// Treat every stage before the target as completed
    #[arg(long, conflicts_with = "assume")]
    pub assume_all: bool,

    /// Output for an assumed stage, as stage=path/to/output.json (repeatable)
    #[arg(long = "supply", value_parser = super::parse_key_val)]
    pub supply: Vec<(String, String)>,
}

/// Outcome of an advance, in both text and JSON form
#[derive(Serialize)]
struct AdvanceReport<'a> {
    pipeline: &'a PipelineId,
    stage: &'a StageId,
    result: &'a ValidationResult,
    current_stage: &'a StageId,
    complete: bool,
}

impl<'a> AdvanceReport<'a> {
    fn new(advance: &'a Advance) -> Self {
        Self {
            pipeline: &advance.pipeline.id,
            stage: &advance.stage,
            result: &advance.result,
            current_stage: &advance.pipeline.current_stage,
            complete: advance.pipeline.is_complete(),
        }
    }
}

impl fmt::Display for AdvanceReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.result.ok {
            return writeln!(f, "Stage '{}' failed validation: {}", self.stage, self.result);
        }
        writeln!(f, "Stage '{}' completed", self.stage)?;
        if self.complete {
            writeln!(f, "Pipeline {} complete", self.pipeline)
        } else {
            writeln!(f, "Current stage: {}", self.current_stage)
        }
    }
}

/// Print the outcome; a failed validation becomes the command's error
fn report(advance: Advance, format: OutputFormat) -> Result<()> {
    output::print(&AdvanceReport::new(&advance), format)?;
    advance.into_checked()?;
    Ok(())
}

pub fn advance(app: &App, args: AdvanceArgs) -> Result<()> {
    let fields = match (&args.output, &args.output_file) {
        (Some(json), _) => parse_fields(json)?,
        (None, Some(path)) => read_fields(path)?,
        (None, None) => anyhow::bail!("one of --output or --output-file is required"),
    };
    let advance = app.coordinator.advance(&args.id, fields)?;
    report(advance, app.format)
}

/// Dispatch the current stage and print the input its collaborator receives
pub fn start(app: &App, id: PipelineId) -> Result<()> {
    let input = app.coordinator.dispatch(&id)?;
    println!("{}", serde_json::to_string_pretty(&input)?);
    Ok(())
}

pub async fn run(app: &App, args: RunArgs) -> Result<()> {
    let pipeline = app.coordinator.status(&args.id)?;
    let stage = pipeline.current_stage.clone();
    let collaborator = app
        .config
        .collaborator(&stage)
        .ok_or_else(|| PfError::no_collaborator(&stage))?;

    let adapter = TracedAdapter::new(CommandAdapter::new(collaborator.command_spec(&app.root)));
    let timeout = app.config.timeout_for(&stage, args.timeout);
    let advance = app.coordinator.run_stage(&args.id, &adapter, timeout).await?;
    report(advance, app.format)
}

pub fn fail(app: &App, id: PipelineId, message: String) -> Result<()> {
    let pipeline = app
        .coordinator
        .fail(&id, StageFailure::Collaborator { message })?;
    print_position(&pipeline, "Marked stage failed", app.format)
}

pub fn jump(app: &App, args: JumpArgs) -> Result<()> {
    let assume: BTreeSet<StageId> = if args.assume_all {
        let registry = app.coordinator.registry();
        let target = registry
            .index_of(&args.stage)
            .ok_or_else(|| anyhow::anyhow!("unknown stage '{}'", args.stage))?;
        registry.all().take(target).cloned().collect()
    } else {
        args.assume.into_iter().collect()
    };

    let mut supplied: BTreeMap<StageId, FieldMap> = BTreeMap::new();
    for (stage, path) in args.supply {
        supplied.insert(StageId::from(stage), read_fields(&PathBuf::from(path))?);
    }

    let pipeline = app.coordinator.jump_to(&args.id, args.stage, assume, supplied)?;
    print_position(&pipeline, "Jumped", app.format)
}

pub fn rollback(app: &App, id: PipelineId, stage: StageId) -> Result<()> {
    let pipeline = app.coordinator.rollback_to(&id, stage)?;
    print_position(&pipeline, "Rolled back", app.format)
}

#[derive(Serialize)]
struct Position<'a> {
    #[serde(skip)]
    action: &'a str,
    pipeline: &'a PipelineId,
    current_stage: &'a StageId,
    status: String,
}

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: pipeline {} at stage '{}' ({})",
            self.action, self.pipeline, self.current_stage, self.status
        )
    }
}

fn print_position(pipeline: &Pipeline, action: &str, format: OutputFormat) -> Result<()> {
    let status = pipeline
        .current()
        .map_or_else(|| "unknown".to_string(), |r| r.status.to_string());
    output::print(
        &Position {
            action,
            pipeline: &pipeline.id,
            current_stage: &pipeline.current_stage,
            status,
        },
        format,
    )
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
