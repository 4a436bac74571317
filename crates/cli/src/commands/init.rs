// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf init <name>` - Create a pipeline

use super::{parse_key_val, App};
use crate::output;
use anyhow::Result;
use clap::{Args, ValueEnum};
use pf_core::{paper, Pipeline, Preferences};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name; the pipeline id is derived from it
    pub name: String,

    /// Research discipline
    #[arg(long, value_enum, ignore_case = true)]
    pub discipline: Option<Discipline>,

    /// Research methodology
    #[arg(long, value_enum, ignore_case = true)]
    pub methodology: Option<Methodology>,

    /// Manuscript language
    #[arg(long, value_enum, ignore_case = true)]
    pub language: Option<Language>,

    /// Citation style
    #[arg(long, value_enum, ignore_case = true)]
    pub citation_style: Option<CitationStyle>,

    /// Extra preference passed to collaborators (key=value)
    #[arg(long = "pref", value_parser = parse_key_val)]
    pub prefs: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Discipline {
    Cs,
    Ml,
    Bio,
    Psych,
    Soc,
    Econ,
    Humanities,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Methodology {
    Quantitative,
    Qualitative,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Language {
    Zh,
    En,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CitationStyle {
    Ieee,
    Apa,
    Mla,
    Chicago,
    Vancouver,
}

impl CitationStyle {
    /// Spelling collaborators expect
    fn as_str(self) -> &'static str {
        match self {
            CitationStyle::Ieee => "IEEE",
            CitationStyle::Apa => "APA",
            CitationStyle::Mla => "MLA",
            CitationStyle::Chicago => "Chicago",
            CitationStyle::Vancouver => "Vancouver",
        }
    }
}

fn value_name<T: ValueEnum>(value: &T) -> Option<String> {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
}

impl InitArgs {
    /// Defaults, then the typed flags, then `--pref` entries
    pub fn preferences(&self) -> Preferences {
        let mut prefs = paper::default_preferences();
        let typed = [
            ("discipline", self.discipline.as_ref().and_then(value_name)),
            ("methodology", self.methodology.as_ref().and_then(value_name)),
            ("language", self.language.as_ref().and_then(value_name)),
            (
                "citation_style",
                self.citation_style.map(|c| c.as_str().to_string()),
            ),
        ];
        for (key, value) in typed {
            if let Some(value) = value {
                prefs.insert(key.to_string(), value);
            }
        }
        prefs.extend(self.prefs.iter().cloned());
        prefs
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct Created<'a>(&'a Pipeline);

impl std::fmt::Display for Created<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Created pipeline {}", self.0.id)?;
        writeln!(f, "  Current stage: {}", self.0.current_stage)
    }
}

pub fn handle(app: &App, args: InitArgs) -> Result<()> {
    let pipeline = app.coordinator.init(&args.name, args.preferences())?;
    output::print(&Created(&pipeline), app.format)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
