//! `pf run` specs
//!
//! Collaborators are small shell scripts configured per stage.

#![cfg(unix)]

use crate::prelude::*;

fn project_with(collaborator: &str) -> Project {
    let project = Project::empty();
    project.config(&format!("{}\n{}", DEMO_CONFIG, collaborator));
    project
}

#[test]
fn run_records_collaborator_output() {
    let project = project_with(
        r#"
[collaborators.search]
command = "sh"
args = ["-c", 'cat > input.json; echo "{\"fields\": {\"query\": \"$0\"}}"', "{discipline}"]
"#,
    );
    let id = project.init("survey");

    project
        .pf()
        .args(&["run", &id])
        .passes()
        .stdout_eq("Stage 'search' completed\nCurrent stage: outline\n");

    let record = project.status(&id);
    assert_eq!(record["stages"][0]["output"]["query"], "cs");
    assert_eq!(record["stages"][0]["attempts"], 1);

    let input: Value = serde_json::from_str(&project.read("input.json")).unwrap();
    assert_eq!(input["stage"], "search");
    assert_eq!(input["pipeline_id"], id.as_str());
}

#[test]
fn collaborator_error_fails_stage_and_exits_6() {
    let project = project_with(
        r#"
[collaborators.search]
command = "sh"
args = ["-c", 'echo "{\"error\": \"search API quota exhausted\"}"']
"#,
    );
    let id = project.init("survey");

    project
        .pf()
        .args(&["run", &id])
        .exits_with(6)
        .stderr_has("search API quota exhausted")
        .stderr_has(&format!("pf run {}", id));

    let record = project.status(&id);
    assert_eq!(record["stages"][0]["status"], "failed");
    assert_eq!(record["stages"][0]["error"]["kind"], "collaborator");
}

#[test]
fn nonzero_exit_reports_stderr() {
    let project = project_with(
        r#"
[collaborators.search]
command = "sh"
args = ["-c", 'echo "model crashed" >&2; exit 3']
"#,
    );
    let id = project.init("survey");

    project
        .pf()
        .args(&["run", &id])
        .exits_with(6)
        .stderr_has("exited with status 3")
        .stderr_has("model crashed");
}

#[test]
fn slow_collaborator_times_out_with_7() {
    let project = project_with(
        r#"
[collaborators.search]
command = "sh"
args = ["-c", "sleep 10"]
"#,
    );
    let id = project.init("survey");

    project
        .pf()
        .args(&["run", &id, "--timeout", "300ms"])
        .exits_with(7)
        .stderr_has("timed out after 300ms");

    let record = project.status(&id);
    assert_eq!(record["stages"][0]["error"]["kind"], "timeout");
    assert_eq!(record["stages"][0]["error"]["after"], "300ms");
}

#[test]
fn configured_timeout_applies() {
    let project = project_with(
        r#"
[collaborators.search]
command = "sh"
args = ["-c", "sleep 10"]
timeout = "200ms"
"#,
    );
    let id = project.init("survey");

    project.pf().args(&["run", &id]).exits_with(7);
}

#[test]
fn invalid_collaborator_output_exits_5() {
    let project = project_with(
        r#"
[collaborators.search]
command = "sh"
args = ["-c", 'echo "{\"fields\": {\"other\": 1}}"']
"#,
    );
    let id = project.init("survey");

    project
        .pf()
        .args(&["run", &id])
        .exits_with(5)
        .stdout_has("missing: query");

    // A failed stage can be run again
    project.config(&format!(
        "{}\n{}",
        DEMO_CONFIG,
        r#"
[collaborators.search]
command = "sh"
args = ["-c", 'echo "{\"fields\": {\"query\": \"retry\"}}"']
"#
    ));
    project.pf().args(&["run", &id]).passes();
    assert_eq!(project.status(&id)["stages"][0]["attempts"], 2);
}
