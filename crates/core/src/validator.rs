// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage output validation
//!
//! Applies a stage's [`FieldRule`]s to a recorded output. Validation is a pure
//! function of `(stage definition, output)`: no clock, no environment, no I/O.

use crate::pipeline::Pipeline;
use crate::registry::{FieldRule, FieldType, RegistryError, StageRegistry};
use crate::stage::{FieldMap, StageId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of validating one stage's output
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    /// Required fields that are absent or empty (nested keys as `field.key`)
    pub missing: Vec<String>,
    /// Fields that are present but malformed
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn passed() -> Self {
        Self {
            ok: true,
            missing: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn from_parts(missing: Vec<String>, errors: Vec<String>) -> Self {
        Self {
            ok: missing.is_empty() && errors.is_empty(),
            missing,
            errors,
        }
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ok {
            return write!(f, "ok");
        }
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing: {}", self.missing.join(", ")));
        }
        parts.extend(self.errors.iter().cloned());
        write!(f, "{}", parts.join("; "))
    }
}

/// Validates stage outputs against a registry
#[derive(Debug, Clone, Copy)]
pub struct StageValidator<'a> {
    registry: &'a StageRegistry,
}

impl<'a> StageValidator<'a> {
    pub fn new(registry: &'a StageRegistry) -> Self {
        Self { registry }
    }

    /// Validate `output` against the rules of `stage`
    pub fn validate(
        &self,
        stage: &StageId,
        output: &FieldMap,
    ) -> Result<ValidationResult, RegistryError> {
        let def = self
            .registry
            .get(stage)
            .ok_or_else(|| RegistryError::UnknownStage(stage.clone()))?;

        let mut missing = Vec::new();
        let mut errors = Vec::new();
        for rule in &def.fields {
            check_field(rule, output.get(&rule.name), &mut missing, &mut errors);
        }
        Ok(ValidationResult::from_parts(missing, errors))
    }

    /// Validate every stage that has recorded output
    ///
    /// Attested stages are skipped: their output was supplied by the caller
    /// and is not expected to satisfy the rules.
    pub fn validate_all(&self, pipeline: &Pipeline) -> BTreeMap<StageId, ValidationResult> {
        let mut results = BTreeMap::new();
        for record in &pipeline.stages {
            if record.attested || record.output.is_empty() {
                continue;
            }
            if let Ok(result) = self.validate(&record.id, &record.output) {
                results.insert(record.id.clone(), result);
            }
        }
        results
    }
}

/// `null`, `""`, `[]` and `{}` count as absent
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn check_field(
    rule: &FieldRule,
    value: Option<&Value>,
    missing: &mut Vec<String>,
    errors: &mut Vec<String>,
) {
    let name = &rule.name;
    let value = match value {
        Some(v) if !is_empty_value(v) => v,
        _ => {
            missing.push(name.clone());
            return;
        }
    };

    match (rule.field_type, value) {
        (FieldType::Any, _) => {}
        (FieldType::Text, Value::String(s)) => {
            if let Some(min) = rule.min_len {
                let len = s.chars().count();
                if len < min {
                    errors.push(format!(
                        "{} must be at least {} characters (got {})",
                        name, min, len
                    ));
                }
            }
        }
        (FieldType::List, Value::Array(items)) => {
            if let Some(min) = rule.min_items {
                if items.len() < min {
                    errors.push(format!(
                        "{} needs at least {} items (got {})",
                        name,
                        min,
                        items.len()
                    ));
                }
            }
        }
        (FieldType::Object, Value::Object(map)) => {
            for key in &rule.keys {
                match map.get(key) {
                    Some(v) if !is_empty_value(v) => {}
                    _ => missing.push(format!("{}.{}", name, key)),
                }
            }
        }
        (FieldType::TextOrObject, Value::String(_) | Value::Object(_)) => {}
        (expected, _) => {
            errors.push(format!(
                "{} must be {} (got {})",
                name,
                describe(expected),
                json_type(value)
            ));
        }
    }
}

fn describe(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Any => "any value",
        FieldType::Text => "a string",
        FieldType::List => "a list",
        FieldType::Object => "an object",
        FieldType::TextOrObject => "a string or an object",
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
