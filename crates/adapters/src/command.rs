// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-backed collaborator
//!
//! The configured program receives the [`StageInput`] as JSON on stdin and
//! answers on stdout with one JSON document:
//!
//! ```json
//! {"fields": {"research_gap": "...", "key_papers": [...]}}
//! {"error": "search API quota exhausted"}
//! ```
//!
//! Arguments may use `{pipeline_id}`, `{stage}` and `{<preference>}`
//! placeholders. A non-zero exit is an error carrying the tail of stderr.
//! The input is written while stdout and stderr are drained, so a program
//! may answer before it has read all of its input.

use crate::template::ArgTemplate;
use async_trait::async_trait;
use pf_core::{CollaboratorError, FieldMap, StageAdapter, StageInput, StageOutput};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Lines of stderr kept in error messages
const STDERR_TAIL_LINES: usize = 20;

/// How to start a collaborator process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reply {
    Output { fields: FieldMap },
    Failure { error: String },
}

/// Runs one external program per stage invocation
#[derive(Debug, Clone)]
pub struct CommandAdapter {
    spec: CommandSpec,
}

impl CommandAdapter {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }
}

#[async_trait]
impl StageAdapter for CommandAdapter {
    async fn run(&self, input: &StageInput) -> Result<StageOutput, CollaboratorError> {
        let payload = serde_json::to_vec(input)
            .map_err(|e| CollaboratorError::new(format!("cannot encode stage input: {}", e)))?;

        let mut cmd = Command::new(&self.spec.program);
        cmd.args(ArgTemplate::for_input(input).render_all(&self.spec.args))
            .env("PF_PIPELINE_ID", input.pipeline_id.as_str())
            .env("PF_STAGE", input.stage.as_str())
            .envs(self.spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.spec.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            CollaboratorError::new(format!("failed to start '{}': {}", self.spec.program, e))
        })?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
            }
            // stdin drops here, closing the pipe
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|e| {
            CollaboratorError::new(format!("failed to wait for '{}': {}", self.spec.program, e))
        })?;
        match fed {
            Ok(()) => {}
            // The program may exit without reading its input
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Err(e) => {
                return Err(CollaboratorError::new(format!(
                    "failed to write stage input: {}",
                    e
                )))
            }
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let tail = stderr_tail(&output.stderr);
            let mut message = format!("'{}' exited with status {}", self.spec.program, code);
            if !tail.is_empty() {
                message.push_str(": ");
                message.push_str(&tail);
            }
            return Err(CollaboratorError::new(message));
        }

        parse_reply(&output.stdout)
    }
}

fn parse_reply(stdout: &[u8]) -> Result<StageOutput, CollaboratorError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Err(CollaboratorError::new("collaborator produced no output"));
    }
    match serde_json::from_str::<Reply>(text) {
        Ok(Reply::Output { fields }) => Ok(StageOutput::new(fields)),
        Ok(Reply::Failure { error }) => Err(CollaboratorError::new(error)),
        Err(e) => Err(CollaboratorError::new(format!(
            "collaborator output is not a fields or error document: {}",
            e
        ))),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
