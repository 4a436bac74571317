// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration
//!
//! Read from `<root>/.paperflow/config.toml`; every key is optional.
//!
//! ```toml
//! store_dir = ".paperflow/pipelines"
//! log_file = ".paperflow/pf.log"
//! default_timeout = "10m"
//!
//! [collaborators.literature_review]
//! command = "python3"
//! args = ["scripts/lit-review.py", "--discipline", "{discipline}"]
//! timeout = "30m"
//! ```
//!
//! `[[stage]]` tables replace the built-in paper workflow with a custom
//! stage registry.

use anyhow::{Context, Result};
use pf_adapters::CommandSpec;
use pf_core::{paper, StageDef, StageId, StageRegistry};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding configuration and default state
pub const STATE_DIR: &str = ".paperflow";

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_STORE_DIR: &str = "pipelines";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where pipeline records live, relative to the project root
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
    /// Optional log file, relative to the project root
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Collaborator deadline when neither `--timeout` nor the stage sets one
    #[serde(default, with = "humantime_serde")]
    pub default_timeout: Option<Duration>,
    #[serde(default, rename = "stage")]
    pub stages: Vec<StageDef>,
    #[serde(default)]
    pub collaborators: BTreeMap<StageId, CollaboratorConfig>,
}

/// External program that runs one stage
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollaboratorConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl CollaboratorConfig {
    /// Process spec with `cwd` resolved against `root`
    pub fn command_spec(&self, root: &Path) -> CommandSpec {
        let cwd = match &self.cwd {
            Some(cwd) => root.join(cwd),
            None => root.to_path_buf(),
        };
        let mut spec = CommandSpec::new(&self.command)
            .args(self.args.iter().cloned())
            .cwd(cwd);
        for (key, value) in &self.env {
            spec = spec.env(key, value);
        }
        spec
    }
}

impl Config {
    /// Load `<root>/.paperflow/config.toml`, or defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(STATE_DIR).join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Stage registry: the configured `[[stage]]` tables, or the paper workflow
    pub fn registry(&self) -> Result<StageRegistry> {
        let registry = if self.stages.is_empty() {
            paper::registry()
        } else {
            StageRegistry::new(self.stages.clone())?
        };
        for stage in self.collaborators.keys() {
            if !registry.contains(stage) {
                anyhow::bail!("collaborator configured for unknown stage '{}'", stage);
            }
        }
        Ok(registry)
    }

    pub fn store_path(&self, root: &Path) -> PathBuf {
        match &self.store_dir {
            Some(dir) => root.join(dir),
            None => root.join(STATE_DIR).join(DEFAULT_STORE_DIR),
        }
    }

    pub fn log_path(&self, root: &Path) -> Option<PathBuf> {
        self.log_file.as_ref().map(|file| root.join(file))
    }

    pub fn collaborator(&self, stage: &StageId) -> Option<&CollaboratorConfig> {
        self.collaborators.get(stage)
    }

    /// Deadline for a stage: explicit flag, then the stage's own, then the default
    pub fn timeout_for(&self, stage: &StageId, flag: Option<Duration>) -> Option<Duration> {
        flag.or_else(|| self.collaborator(stage).and_then(|c| c.timeout))
            .or(self.default_timeout)
    }
}

/// Find the project root
///
/// `PF_ROOT` wins; otherwise the nearest ancestor holding `.paperflow/`,
/// falling back to the current directory.
pub fn find_project_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("PF_ROOT") {
        return Ok(PathBuf::from(root));
    }

    let cwd = std::env::current_dir().context("could not determine current directory")?;
    let mut current = cwd.clone();
    loop {
        if current.join(STATE_DIR).is_dir() {
            return Ok(current);
        }
        if !current.pop() {
            return Ok(cwd);
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
