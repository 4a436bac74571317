// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod init;
pub mod pipeline;
pub mod stage;

use crate::config::Config;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use pf_core::{FieldMap, SlugIdGen, SystemClock};
use pf_engine::Coordinator;
use pf_storage::JsonStore;
use std::path::{Path, PathBuf};

pub type PfCoordinator = Coordinator<JsonStore, SystemClock, SlugIdGen>;

/// Everything a command needs, built once per invocation
pub struct App {
    pub root: PathBuf,
    pub config: Config,
    pub coordinator: PfCoordinator,
    pub format: OutputFormat,
}

impl App {
    pub fn open(root: PathBuf, config: Config, format: OutputFormat) -> Result<Self> {
        let registry = config.registry()?;
        let store = JsonStore::open(config.store_path(&root))?;
        let coordinator = Coordinator::new(store, registry, SystemClock, SlugIdGen);
        Ok(Self {
            root,
            config,
            coordinator,
            format,
        })
    }
}

pub(crate) fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse a JSON object into stage fields
pub(crate) fn parse_fields(json: &str) -> Result<FieldMap> {
    let value: serde_json::Value = serde_json::from_str(json).context("output is not valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => anyhow::bail!("output must be a JSON object, got {}", json_type(&other)),
    }
}

pub(crate) fn read_fields(path: &Path) -> Result<FieldMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_fields(&content).with_context(|| format!("in {}", path.display()))
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
