// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only pipeline commands plus `delete`

use super::App;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use pf_core::{PaperPayload, Pipeline, PipelineId, StageId, StageRecord, ValidationResult};
use pf_storage::ContextStore;
use serde::Serialize;
use std::fmt;

/// Longest summary shown in the status table
const SUMMARY_WIDTH: usize = 60;

/// One-line description of a stage's recorded state
fn stage_summary(record: &StageRecord) -> String {
    if let Some(error) = &record.error {
        return error.to_string();
    }
    if record.output.is_empty() {
        return "-".to_string();
    }
    let summary = match PaperPayload::from_fields(&record.id, &record.output) {
        Ok(payload) => payload.summary(),
        Err(_) => {
            let names: Vec<&str> = record.output.keys().map(String::as_str).collect();
            format!("fields: {}", names.join(", "))
        }
    };
    if record.attested {
        format!("{} (attested)", summary)
    } else {
        summary
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let cut: String = s.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[derive(Serialize)]
#[serde(transparent)]
struct StatusView<'a>(&'a Pipeline);

impl fmt::Display for StatusView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(f, "Pipeline: {}", p.id)?;
        writeln!(f, "  Name: {}", p.name)?;
        if p.is_complete() {
            writeln!(f, "  Current stage: {} (pipeline complete)", p.current_stage)?;
        } else if let Some(current) = p.current() {
            writeln!(f, "  Current stage: {} ({})", current.id, current.status)?;
        }
        writeln!(f, "  Created: {}", p.created_at.to_rfc3339())?;
        writeln!(f, "  Updated: {}", p.updated_at.to_rfc3339())?;
        if !p.preferences.is_empty() {
            let prefs: Vec<String> = p
                .preferences
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            writeln!(f, "  Preferences: {}", prefs.join(" "))?;
        }
        writeln!(f)?;
        writeln!(f, "  {:<3} {:<20} {:<12} {:<8} SUMMARY", "#", "STAGE", "STATUS", "ATTEMPTS")?;
        for (i, record) in p.stages.iter().enumerate() {
            let marker = if record.id == p.current_stage { ">" } else { " " };
            writeln!(
                f,
                "{} {:<3} {:<20} {:<12} {:<8} {}",
                marker,
                i + 1,
                record.id,
                record.status,
                record.attempts,
                truncate(&stage_summary(record), SUMMARY_WIDTH)
            )?;
        }
        Ok(())
    }
}

pub fn status(app: &App, id: PipelineId) -> Result<()> {
    let pipeline = app.coordinator.status(&id)?;
    output::print(&StatusView(&pipeline), app.format)
}

#[derive(Serialize)]
struct PipelineRow {
    id: PipelineId,
    name: String,
    current_stage: StageId,
    status: String,
    updated_at: String,
}

impl fmt::Display for PipelineRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<32} {:<24} {:<20} {}",
            self.id,
            truncate(&self.name, 24),
            self.current_stage,
            self.status
        )
    }
}

impl PipelineRow {
    fn new(pipeline: &Pipeline) -> Self {
        let status = if pipeline.is_complete() {
            "complete".to_string()
        } else {
            pipeline
                .current()
                .map_or_else(|| "unknown".to_string(), |r| r.status.to_string())
        };
        Self {
            id: pipeline.id.clone(),
            name: pipeline.name.clone(),
            current_stage: pipeline.current_stage.clone(),
            status,
            updated_at: pipeline.updated_at.to_rfc3339(),
        }
    }
}

pub fn list(app: &App) -> Result<()> {
    let mut rows = Vec::new();
    for id in app.coordinator.list()? {
        match app.coordinator.status(&id) {
            Ok(pipeline) => rows.push(PipelineRow::new(&pipeline)),
            Err(e) => tracing::warn!(pipeline = %id, error = %e, "skipping unreadable pipeline"),
        }
    }
    if app.format == OutputFormat::Text && !rows.is_empty() {
        println!("{:<32} {:<24} {:<20} STATUS", "ID", "NAME", "STAGE");
    }
    output::print_list(&rows, "No pipelines", app.format)
}

#[derive(Serialize)]
struct StageRow {
    position: usize,
    id: StageId,
    title: String,
    fields: Vec<String>,
}

impl fmt::Display for StageRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. {:<20} {:<24} {}",
            self.position,
            self.id,
            self.title,
            self.fields.join(", ")
        )
    }
}

pub fn stages(app: &App) -> Result<()> {
    let rows: Vec<StageRow> = app
        .coordinator
        .registry()
        .definitions()
        .iter()
        .enumerate()
        .map(|(i, def)| StageRow {
            position: i + 1,
            id: def.id.clone(),
            title: def.display_name().to_string(),
            fields: def.required_fields().map(str::to_string).collect(),
        })
        .collect();
    output::print_list(&rows, "No stages", app.format)
}

/// Per-stage results in pipeline order
struct ValidationReport(Vec<(StageId, ValidationResult)>);

impl Serialize for ValidationReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(stage, result)| (stage, result)))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No stage output recorded");
        }
        for (stage, result) in &self.0 {
            if result.ok {
                writeln!(f, "{:<20} ok", stage)?;
            } else {
                writeln!(f, "{:<20} FAILED {}", stage, result)?;
            }
        }
        Ok(())
    }
}

/// Re-check every stage that has recorded output
///
/// Reports only; a failing stage does not change the exit code.
pub fn validate(app: &App, id: PipelineId) -> Result<()> {
    let pipeline = app.coordinator.status(&id)?;
    let mut results = app.coordinator.validate(&id)?;
    let ordered = pipeline
        .stages
        .iter()
        .filter_map(|r| results.remove_entry(&r.id))
        .collect();
    output::print(&ValidationReport(ordered), app.format)
}

pub fn delete(app: &App, id: PipelineId) -> Result<()> {
    app.coordinator.store().delete(&id)?;
    tracing::info!(pipeline = %id, "pipeline deleted");
    match app.format {
        OutputFormat::Text => println!("Deleted pipeline {}", id),
        OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": id })),
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
