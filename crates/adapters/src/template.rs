// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Placeholders in collaborator arguments
//!
//! An argument such as `--style={citation_style}` is filled from the stage
//! input: `{pipeline_id}`, `{stage}` and every preference key. Names that are
//! not known pass through untouched, so JSON literals survive. Nothing is
//! read from the process environment.

use pf_core::StageInput;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("constant regex pattern is valid")
});

/// Values available to one collaborator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgTemplate<'a> {
    values: BTreeMap<&'a str, &'a str>,
}

impl<'a> ArgTemplate<'a> {
    /// Preferences first; `pipeline_id` and `stage` cannot be shadowed by them
    pub fn for_input(input: &'a StageInput) -> Self {
        let mut values: BTreeMap<&str, &str> = input
            .preferences
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        values.insert("pipeline_id", input.pipeline_id.as_str());
        values.insert("stage", input.stage.as_str());
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).copied()
    }

    pub fn render(&self, arg: &str) -> String {
        PLACEHOLDER
            .replace_all(arg, |caps: &regex::Captures| match self.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    pub fn render_all<'s>(&self, args: impl IntoIterator<Item = &'s String>) -> Vec<String> {
        args.into_iter().map(|arg| self.render(arg)).collect()
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
