// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! Every failure reaching `main` is turned into a [`PfError`]:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)
//!
//! and the process exits with the code of its [`ErrorKind`].

use pf_core::{ErrorKind, PipelineId, StageId};
use pf_engine::CoordinatorError;
use pf_storage::StoreError;
use std::fmt;

/// Exit code for failures without a kind (usage, configuration)
pub const EXIT_OTHER: i32 = 1;

/// Process exit code for an error kind
pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NotFound => 3,
        ErrorKind::InvalidTransition => 4,
        ErrorKind::ValidationFailed => 5,
        ErrorKind::CollaboratorError => 6,
        ErrorKind::CollaboratorTimeout => 7,
        ErrorKind::Io => 8,
        ErrorKind::CorruptRecord => 9,
    }
}

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct PfError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub kind: Option<ErrorKind>,
}

impl PfError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            kind: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.map_or(EXIT_OTHER, exit_code)
    }

    /// Classify whatever bubbled up to `main`
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let err = match err.downcast::<PfError>() {
            Ok(pf) => return pf,
            Err(err) => err,
        };
        if let Some(coordinator) = err.downcast_ref::<CoordinatorError>() {
            return Self::from_coordinator(coordinator);
        }
        if let Some(store) = err.downcast_ref::<StoreError>() {
            return Self::from_store(store);
        }
        PfError::new(format!("{:#}", err))
    }

    pub fn from_coordinator(err: &CoordinatorError) -> Self {
        let kind = err.kind();
        let mut pf = PfError::new(err.to_string()).with_kind(kind);
        let id = err.pipeline().map(PipelineId::to_string);
        let id = id.as_deref().unwrap_or("<id>");

        match err {
            CoordinatorError::ValidationFailed { result, .. } => {
                for field in &result.missing {
                    pf = pf.with_context(format!("missing field: {}", field));
                }
                for error in &result.errors {
                    pf = pf.with_context(error.clone());
                }
                pf = pf
                    .with_context("the output was recorded and the stage marked failed")
                    .with_suggestion(format!("Dispatch the stage again: pf start {}", id))
                    .with_suggestion(format!(
                        "Submit corrected output: pf advance {} --output-file <path>",
                        id
                    ));
            }
            CoordinatorError::RegistryMismatch { .. } => {
                pf = pf
                    .with_context("the record was written with a different stage registry")
                    .with_suggestion("Check the [[stage]] tables in .paperflow/config.toml");
            }
            CoordinatorError::IdExhausted { .. } => {
                pf = pf.with_suggestion("Pick a different pipeline name");
            }
            _ => pf = pf.suggest_for_kind(kind, id, err.stage()),
        }
        pf
    }

    pub fn from_store(err: &StoreError) -> Self {
        let id = match err {
            StoreError::NotFound { id }
            | StoreError::Corrupt { id, .. }
            | StoreError::UnsupportedVersion { id, .. } => id.to_string(),
            StoreError::Io { .. } => "<id>".to_string(),
        };
        PfError::new(err.to_string())
            .with_kind(err.kind())
            .suggest_for_kind(err.kind(), &id, None)
    }

    fn suggest_for_kind(self, kind: ErrorKind, id: &str, stage: Option<&StageId>) -> Self {
        match kind {
            ErrorKind::NotFound => self
                .with_context("no record with that id exists in the store")
                .with_suggestion("List pipelines: pf list"),
            ErrorKind::InvalidTransition => self
                .with_suggestion(format!("Check the pipeline state: pf status {}", id)),
            ErrorKind::CollaboratorError => self
                .with_context("the stage was marked failed")
                .with_suggestion(format!("Retry the stage: pf run {}", id)),
            ErrorKind::CollaboratorTimeout => self
                .with_context("the stage was marked failed")
                .with_suggestion(format!("Allow more time: pf run {} --timeout 30m", id)),
            ErrorKind::Io => self
                .with_context("the store directory may be missing or not writable")
                .with_suggestion("Check permissions under .paperflow/"),
            ErrorKind::CorruptRecord => {
                let mut pf = self.with_context("the stored record could not be used as-is");
                if let Some(stage) = stage {
                    pf = pf.with_context(format!("active stage: {}", stage));
                }
                pf.with_suggestion("Restore the record from a backup")
                    .with_suggestion(format!("Or remove it: pf delete {}", id))
            }
            ErrorKind::ValidationFailed => self,
        }
    }

    /// No collaborator is configured for the stage `pf run` would execute
    pub fn no_collaborator(stage: &StageId) -> Self {
        PfError::new(format!("no collaborator configured for stage '{}'", stage))
            .with_context("pf run needs an external command for the current stage")
            .with_suggestion(format!(
                "Add a [collaborators.{}] table with a `command` to .paperflow/config.toml",
                stage
            ))
            .with_suggestion("Or run the stage yourself and submit its output with pf advance")
    }
}

impl fmt::Display for PfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for PfError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
