//! Shared helpers for CLI specs
//!
//! Each spec gets a fresh [`Project`] in a temp directory and drives the
//! `pf` binary against it with `--root`.

#![allow(dead_code)]
// cargo_bin resolves workspace binaries from the shared target dir
#![allow(deprecated)]

use std::path::{Path, PathBuf};
use std::process::Output;

pub use serde_json::{json, Value};

/// Custom three-stage registry used by most specs
pub const DEMO_CONFIG: &str = r#"
[[stage]]
id = "search"
[[stage.field]]
name = "query"
type = "text"

[[stage]]
id = "outline"
[[stage.field]]
name = "points"
type = "list"

[[stage]]
id = "draft"
[[stage.field]]
name = "text"
type = "text"
"#;

pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Project with the demo registry configured
    pub fn demo() -> Self {
        let project = Self::empty();
        project.config(DEMO_CONFIG);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn config(&self, content: &str) {
        self.file(".paperflow/config.toml", content);
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).unwrap()
    }

    pub fn record_path(&self, id: &str) -> PathBuf {
        self.dir
            .path()
            .join(".paperflow/pipelines")
            .join(format!("{}.json", id))
    }

    pub fn pf(&self) -> Cli {
        let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin("pf"));
        cmd.arg("--root").arg(self.dir.path());
        cmd.env_remove("RUST_LOG").env_remove("PF_ROOT");
        Cli { cmd }
    }

    /// Create a pipeline and return its id
    pub fn init(&self, name: &str) -> String {
        let record = self
            .pf()
            .args(&["--format", "json", "init", name])
            .passes()
            .json();
        record["id"].as_str().unwrap().to_string()
    }

    /// Current record as JSON
    pub fn status(&self, id: &str) -> Value {
        self.pf()
            .args(&["--format", "json", "status", id])
            .passes()
            .json()
    }

    pub fn stage_status(&self, id: &str, stage: &str) -> String {
        let record = self.status(id);
        record["stages"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["id"] == stage)
            .map(|s| s["status"].as_str().unwrap().to_string())
            .unwrap()
    }
}

pub struct Cli {
    cmd: assert_cmd::Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    fn output(mut self) -> Output {
        self.cmd.output().unwrap()
    }

    /// Run and expect exit code 0
    pub fn passes(self) -> Run {
        let output = self.output();
        let run = Run { output };
        assert!(
            run.output.status.success(),
            "expected success, got {:?}\nstdout:\n{}\nstderr:\n{}",
            run.output.status.code(),
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and expect a specific non-zero exit code
    pub fn exits_with(self, code: i32) -> Run {
        let output = self.output();
        let run = Run { output };
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "unexpected exit code\nstdout:\n{}\nstderr:\n{}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(needle), "stdout missing {:?}:\n{}", needle, stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(needle), "stderr missing {:?}:\n{}", needle, stderr);
        self
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.output.stdout).unwrap()
    }
}
