// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in paper writing workflow
//!
//! Five stages, each owning its output schema:
//!
//! ```text
//! literature_review -> hypothesis -> code -> experiment -> writing
//! ```
//!
//! The coordinator works on untyped [`FieldMap`]s; [`PaperPayload`] gives
//! collaborators and the CLI a typed view of the same documents.

use crate::pipeline::Preferences;
use crate::registry::{FieldRule, FieldType, StageDef, StageRegistry};
use crate::stage::{FieldMap, StageId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const LITERATURE_REVIEW: &str = "literature_review";
pub const HYPOTHESIS: &str = "hypothesis";
pub const CODE: &str = "code";
pub const EXPERIMENT: &str = "experiment";
pub const WRITING: &str = "writing";

/// Manuscript sections every draft must contain
pub const SECTIONS: [&str; 5] = ["abstract", "introduction", "method", "experiments", "conclusion"];

/// Stage definitions of the paper workflow, in order
pub fn definitions() -> Vec<StageDef> {
    vec![
        StageDef::new(LITERATURE_REVIEW)
            .with_title("Literature review")
            .field(FieldRule::new("research_gap", FieldType::Text).min_len(50))
            .field(FieldRule::new("key_papers", FieldType::List).min_items(5))
            .require("summary", FieldType::Any),
        StageDef::new(HYPOTHESIS)
            .with_title("Hypothesis generation")
            .field(FieldRule::new("hypotheses", FieldType::List).min_items(1))
            .field(FieldRule::new("experiment_designs", FieldType::List).min_items(1))
            .field(FieldRule::new("feasibility", FieldType::Object).keys(&["data", "method"])),
        StageDef::new(CODE)
            .with_title("Code implementation")
            .require("repo_url", FieldType::Text)
            .require("config", FieldType::TextOrObject),
        StageDef::new(EXPERIMENT)
            .with_title("Experiment execution")
            .require("results", FieldType::Object)
            .field(FieldRule::new("tables", FieldType::List).min_items(1))
            .require("analysis", FieldType::Any),
        StageDef::new(WRITING)
            .with_title("Paper writing")
            .field(FieldRule::new("sections", FieldType::Object).keys(&SECTIONS))
            .require("drafts", FieldType::List),
    ]
}

/// The paper workflow registry
// The definitions above are constant and covered by tests
#[allow(clippy::expect_used)]
pub fn registry() -> StageRegistry {
    StageRegistry::new(definitions()).expect("built-in paper registry is valid")
}

/// Preferences a new paper pipeline starts with
pub fn default_preferences() -> Preferences {
    [
        ("discipline", "cs"),
        ("methodology", "quantitative"),
        ("language", "zh"),
        ("citation_style", "IEEE"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Errors converting between field maps and typed payloads
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("'{0}' is not a paper workflow stage")]
    UnknownStage(StageId),
    #[error("{stage} output does not match its schema: {source}")]
    Shape {
        stage: StageId,
        #[source]
        source: serde_json::Error,
    },
    #[error("payload is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteratureReview {
    pub research_gap: String,
    pub key_papers: Vec<Value>,
    pub summary: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feasibility {
    pub data: Value,
    pub method: Value,
    #[serde(flatten)]
    pub notes: FieldMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub hypotheses: Vec<Value>,
    pub experiment_designs: Vec<Value>,
    pub feasibility: Feasibility,
}

/// Experiment configuration: a path to a file, or the settings inline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeConfig {
    Path(String),
    Inline(FieldMap),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub repo_url: String,
    pub config: CodeConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_results: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub results: FieldMap,
    pub tables: Vec<Value>,
    pub analysis: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub figures: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sections {
    #[serde(rename = "abstract")]
    pub abstract_: Value,
    pub introduction: Value,
    pub method: Value,
    pub experiments: Value,
    pub conclusion: Value,
    #[serde(flatten)]
    pub extra: FieldMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Writing {
    pub sections: Sections,
    pub drafts: Vec<Value>,
}

/// Typed output of one paper workflow stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "output", rename_all = "snake_case")]
pub enum PaperPayload {
    LiteratureReview(LiteratureReview),
    Hypothesis(Hypothesis),
    Code(Code),
    Experiment(Experiment),
    Writing(Writing),
}

impl PaperPayload {
    /// Parse a stage's recorded output into its typed form
    pub fn from_fields(stage: &StageId, fields: &FieldMap) -> Result<Self, PayloadError> {
        let value = Value::Object(fields.clone().into_iter().collect());
        let shape = |source| PayloadError::Shape {
            stage: stage.clone(),
            source,
        };
        let payload = match stage.as_str() {
            LITERATURE_REVIEW => {
                PaperPayload::LiteratureReview(serde_json::from_value(value).map_err(shape)?)
            }
            HYPOTHESIS => PaperPayload::Hypothesis(serde_json::from_value(value).map_err(shape)?),
            CODE => PaperPayload::Code(serde_json::from_value(value).map_err(shape)?),
            EXPERIMENT => PaperPayload::Experiment(serde_json::from_value(value).map_err(shape)?),
            WRITING => PaperPayload::Writing(serde_json::from_value(value).map_err(shape)?),
            _ => return Err(PayloadError::UnknownStage(stage.clone())),
        };
        Ok(payload)
    }

    pub fn stage(&self) -> StageId {
        let id = match self {
            PaperPayload::LiteratureReview(_) => LITERATURE_REVIEW,
            PaperPayload::Hypothesis(_) => HYPOTHESIS,
            PaperPayload::Code(_) => CODE,
            PaperPayload::Experiment(_) => EXPERIMENT,
            PaperPayload::Writing(_) => WRITING,
        };
        StageId::from(id)
    }

    /// Flatten back into the field map the coordinator records
    pub fn into_fields(self) -> Result<FieldMap, PayloadError> {
        let stage = self.stage();
        let value = match self {
            PaperPayload::LiteratureReview(p) => serde_json::to_value(p),
            PaperPayload::Hypothesis(p) => serde_json::to_value(p),
            PaperPayload::Code(p) => serde_json::to_value(p),
            PaperPayload::Experiment(p) => serde_json::to_value(p),
            PaperPayload::Writing(p) => serde_json::to_value(p),
        };
        match value {
            Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
            Ok(_) => Err(PayloadError::NotAnObject),
            Err(source) => Err(PayloadError::Shape { stage, source }),
        }
    }

    /// One-line description for status listings
    pub fn summary(&self) -> String {
        match self {
            PaperPayload::LiteratureReview(p) => format!("{} key papers", p.key_papers.len()),
            PaperPayload::Hypothesis(p) => format!(
                "{} hypotheses, {} experiment designs",
                p.hypotheses.len(),
                p.experiment_designs.len()
            ),
            PaperPayload::Code(p) => match &p.config {
                CodeConfig::Path(path) => format!("{} (config {})", p.repo_url, path),
                CodeConfig::Inline(_) => format!("{} (inline config)", p.repo_url),
            },
            PaperPayload::Experiment(p) => format!(
                "{} tables, {} result entries",
                p.tables.len(),
                p.results.len()
            ),
            PaperPayload::Writing(p) => format!(
                "{} sections, {} drafts",
                SECTIONS.len() + p.sections.extra.len(),
                p.drafts.len()
            ),
        }
    }
}

#[cfg(test)]
#[path = "paper_tests.rs"]
mod tests;
