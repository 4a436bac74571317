// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned record format
//!
//! ```json
//! { "schema_version": 1, "pipeline": { "id": "...", "stages": [...] } }
//! ```

use crate::error::StoreError;
use pf_core::{Pipeline, PipelineId};
use serde::Serialize;
use serde_json::Value;

/// Current version of the record format
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    schema_version: u32,
    pipeline: &'a Pipeline,
}

/// Serialize a pipeline as a current-version document
pub fn encode(pipeline: &Pipeline) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&DocumentRef {
        schema_version: SCHEMA_VERSION,
        pipeline,
    })
}

/// Parse a document stored under `id`
pub fn decode(id: &PipelineId, text: &str) -> Result<Pipeline, StoreError> {
    let mut doc: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::corrupt(id, format!("invalid JSON: {}", e)))?;

    let version = doc
        .get("schema_version")
        .ok_or_else(|| StoreError::corrupt(id, "missing schema_version"))?
        .as_u64()
        .ok_or_else(|| StoreError::corrupt(id, "schema_version is not a number"))?;

    if version > u64::from(SCHEMA_VERSION) {
        return Err(StoreError::UnsupportedVersion {
            id: id.clone(),
            found: version,
            supported: SCHEMA_VERSION,
        });
    }
    upgrade(id, &mut doc, version)?;

    let pipeline = doc
        .get_mut("pipeline")
        .map(Value::take)
        .ok_or_else(|| StoreError::corrupt(id, "missing pipeline"))?;
    let pipeline: Pipeline = serde_json::from_value(pipeline)
        .map_err(|e| StoreError::corrupt(id, format!("pipeline does not parse: {}", e)))?;

    if &pipeline.id != id {
        return Err(StoreError::corrupt(
            id,
            format!("record holds pipeline '{}'", pipeline.id),
        ));
    }
    Ok(pipeline)
}

/// Bring an older document up to [`SCHEMA_VERSION`] in place
fn upgrade(id: &PipelineId, _doc: &mut Value, version: u64) -> Result<(), StoreError> {
    match version {
        1 => Ok(()),
        other => Err(StoreError::corrupt(
            id,
            format!("unknown schema version {}", other),
        )),
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
