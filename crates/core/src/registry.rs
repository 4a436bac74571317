// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage registry: the fixed, ordered definition of a pipeline
//!
//! A registry is built once at process start, either in code, from a TOML
//! document, or from the built-in paper workflow (see [`crate::paper`]).
//! It is never persisted; pipelines are checked against it when loaded.
//!
//! ```toml
//! [[stage]]
//! id = "search"
//! title = "Literature search"
//!
//! [[stage.field]]
//! name = "query"
//! type = "text"
//! min_len = 3
//! ```

use crate::pipeline::Pipeline;
use crate::stage::StageId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static STAGE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("constant regex pattern is valid"));

/// Errors building or consulting a registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry defines no stages")]
    Empty,
    #[error("stage '{0}' is defined more than once")]
    DuplicateStage(StageId),
    #[error("invalid stage id '{0}': use lowercase letters, digits and '_', starting with a letter")]
    InvalidStageId(String),
    #[error("stage '{stage}' declares field '{field}' more than once")]
    DuplicateField { stage: StageId, field: String },
    #[error("unknown stage: {0}")]
    UnknownStage(StageId),
    #[error("pipeline does not match registry: {0}")]
    Mismatch(String),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// JSON shape a field's value must have
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Any non-empty value
    #[default]
    Any,
    Text,
    List,
    Object,
    /// A string (e.g. a path) or an object (inline configuration)
    TextOrObject,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Any => "any",
            FieldType::Text => "text",
            FieldType::List => "list",
            FieldType::Object => "object",
            FieldType::TextOrObject => "text_or_object",
        }
    }
}

/// A required output field of a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Minimum character count for text values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    /// Minimum element count for list values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    /// Keys that must be present and non-empty in object values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            min_len: None,
            min_items: None,
            keys: Vec::new(),
        }
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn keys(mut self, keys: &[&str]) -> Self {
        self.keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }
}

/// Definition of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDef {
    pub id: StageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldRule>,
}

impl StageDef {
    pub fn new(id: impl Into<StageId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            fields: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Require a field of the given type
    pub fn require(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field(FieldRule::new(name, field_type))
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Display name: the title if set, otherwise the id
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(self.id.as_str())
    }

    /// Names of the required top-level fields
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "stage")]
    stages: Vec<StageDef>,
}

/// Ordered, validated set of stage definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRegistry {
    stages: Vec<StageDef>,
}

impl StageRegistry {
    /// Build a registry; order of `stages` is pipeline order.
    pub fn new(stages: Vec<StageDef>) -> Result<Self, RegistryError> {
        if stages.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for def in &stages {
            if !STAGE_ID_PATTERN.is_match(def.id.as_str()) {
                return Err(RegistryError::InvalidStageId(def.id.0.clone()));
            }
            if !seen.insert(def.id.clone()) {
                return Err(RegistryError::DuplicateStage(def.id.clone()));
            }
            let mut fields = HashSet::new();
            for rule in &def.fields {
                if !fields.insert(rule.name.as_str()) {
                    return Err(RegistryError::DuplicateField {
                        stage: def.id.clone(),
                        field: rule.name.clone(),
                    });
                }
            }
        }

        Ok(Self { stages })
    }

    /// Parse `[[stage]]` tables from TOML
    pub fn from_toml(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(content)?;
        Self::new(file.stages)
    }

    /// All stage ids in pipeline order
    pub fn all(&self) -> impl DoubleEndedIterator<Item = &StageId> + ExactSizeIterator {
        self.stages.iter().map(|s| &s.id)
    }

    pub fn definitions(&self) -> &[StageDef] {
        &self.stages
    }

    pub fn get(&self, id: &StageId) -> Option<&StageDef> {
        self.stages.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &StageId) -> bool {
        self.get(id).is_some()
    }

    /// Position of a stage in pipeline order
    pub fn index_of(&self, id: &StageId) -> Option<usize> {
        self.stages.iter().position(|s| &s.id == id)
    }

    /// Stage after `id`, or `None` at the final stage (or for unknown ids)
    pub fn next(&self, id: &StageId) -> Option<&StageId> {
        self.index_of(id)
            .and_then(|i| self.stages.get(i + 1))
            .map(|s| &s.id)
    }

    /// Stage before `id`, or `None` at the first stage (or for unknown ids)
    pub fn previous(&self, id: &StageId) -> Option<&StageId> {
        self.index_of(id)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.stages.get(i))
            .map(|s| &s.id)
    }

    pub fn first(&self) -> &StageId {
        &self.stages[0].id
    }

    pub fn last(&self) -> &StageId {
        &self.stages[self.stages.len() - 1].id
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Index of a stage, or `UnknownStage`
    pub fn require_index(&self, id: &StageId) -> Result<usize, RegistryError> {
        self.index_of(id)
            .ok_or_else(|| RegistryError::UnknownStage(id.clone()))
    }

    /// Verify a loaded pipeline has exactly this registry's stages, in order,
    /// and that its current stage is one of them.
    pub fn check(&self, pipeline: &Pipeline) -> Result<(), RegistryError> {
        let recorded: Vec<&StageId> = pipeline.stages.iter().map(|s| &s.id).collect();
        let expected: Vec<&StageId> = self.all().collect();
        if recorded != expected {
            return Err(RegistryError::Mismatch(format!(
                "stages [{}] do not match registry [{}]",
                join_ids(&recorded),
                join_ids(&expected)
            )));
        }
        if !self.contains(&pipeline.current_stage) {
            return Err(RegistryError::Mismatch(format!(
                "current stage '{}' is not in the registry",
                pipeline.current_stage
            )));
        }
        Ok(())
    }
}

fn join_ids(ids: &[&StageId]) -> String {
    ids.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
