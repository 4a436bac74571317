//! Error reporting and exit code specs

use crate::prelude::*;

#[test]
fn unknown_pipeline_exits_3() {
    Project::demo()
        .pf()
        .args(&["status", "nope"])
        .exits_with(3)
        .stderr_has("error: pipeline not found: nope")
        .stderr_has("pf list");
}

#[test]
fn advance_on_unknown_pipeline_exits_3() {
    Project::demo()
        .pf()
        .args(&["advance", "nope", "--output", "{}"])
        .exits_with(3);
}

#[test]
fn output_must_be_json_object() {
    let project = Project::demo();
    let id = project.init("survey");
    project
        .pf()
        .args(&["advance", &id, "--output", "[1, 2]"])
        .exits_with(1)
        .stderr_has("must be a JSON object");
    assert_eq!(project.stage_status(&id, "search"), "pending");
}

#[test]
fn invalid_config_exits_1() {
    let project = Project::empty();
    project.config("store_dir = 3\n");
    project
        .pf()
        .args(&["list"])
        .exits_with(1)
        .stderr_has("invalid config");
}

#[test]
fn run_without_collaborator_explains_config() {
    let project = Project::demo();
    let id = project.init("survey");
    project
        .pf()
        .args(&["run", &id])
        .exits_with(1)
        .stderr_has("no collaborator configured for stage 'search'")
        .stderr_has("[collaborators.search]");
}
