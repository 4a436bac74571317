//! Status, list and validate specs

use crate::prelude::*;

#[test]
fn list_empty() {
    Project::demo()
        .pf()
        .args(&["list"])
        .passes()
        .stdout_eq("No pipelines\n");
}

#[test]
fn list_shows_every_pipeline() {
    let project = Project::demo();
    let a = project.init("alpha");
    let b = project.init("beta");

    let run = project.pf().args(&["list"]).passes();
    run.stdout_has("ID").stdout_has(&a).stdout_has(&b);

    let rows = project.pf().args(&["--format", "json", "list"]).passes().json();
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["current_stage"], "search");
}

#[test]
fn status_text_marks_current_stage() {
    let project = Project::demo();
    let id = project.init("survey");
    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "q"}"#])
        .passes();

    project
        .pf()
        .args(&["status", &id])
        .passes()
        .stdout_has(&format!("Pipeline: {}", id))
        .stdout_has("Current stage: outline (pending)")
        .stdout_has("fields: query")
        .stdout_has("> 2   outline");
}

#[test]
fn validate_reports_without_failing() {
    let project = Project::demo();
    let id = project.init("survey");

    project
        .pf()
        .args(&["validate", &id])
        .passes()
        .stdout_eq("No stage output recorded\n");

    project.pf().args(&["advance", &id, "--output", r#"{"query": ""}"#]).exits_with(5);
    let report = project
        .pf()
        .args(&["--format", "json", "validate", &id])
        .passes()
        .json();
    assert_eq!(report["search"]["ok"], false);
    assert_eq!(report["search"]["missing"], json!(["query"]));
}

#[test]
fn delete_removes_record() {
    let project = Project::demo();
    let id = project.init("survey");

    project
        .pf()
        .args(&["delete", &id])
        .passes()
        .stdout_eq(&format!("Deleted pipeline {}\n", id));
    assert!(!project.record_path(&id).exists());
    project.pf().args(&["status", &id]).exits_with(3);
    project.pf().args(&["delete", &id]).exits_with(3);
}
