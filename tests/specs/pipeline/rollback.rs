//! Rollback specs

use crate::prelude::*;

fn advanced_to_draft(project: &Project) -> String {
    let id = project.init("survey");
    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "q"}"#])
        .passes();
    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"points": ["a"]}"#])
        .passes();
    id
}

#[test]
fn rollback_resets_target_and_later_stages() {
    let project = Project::demo();
    let id = advanced_to_draft(&project);

    project
        .pf()
        .args(&["rollback", &id, "outline"])
        .passes()
        .stdout_eq(&format!("Rolled back: pipeline {} at stage 'outline' (pending)\n", id));

    let record = project.status(&id);
    assert_eq!(record["current_stage"], "outline");
    assert_eq!(record["stages"][0]["status"], "completed");
    assert_eq!(record["stages"][0]["output"]["query"], "q");
    assert_eq!(record["stages"][1]["status"], "pending");
    assert_eq!(record["stages"][1]["output"], json!({}));
}

#[test]
fn repeated_rollback_leaves_record_untouched() {
    let project = Project::demo();
    let id = advanced_to_draft(&project);
    project.pf().args(&["rollback", &id, "search"]).passes();
    let first = std::fs::read_to_string(project.record_path(&id)).unwrap();

    project.pf().args(&["rollback", &id, "search"]).passes();
    let second = std::fs::read_to_string(project.record_path(&id)).unwrap();
    similar_asserts::assert_eq!(first, second);
}

#[test]
fn rollback_forward_is_rejected() {
    let project = Project::demo();
    let id = project.init("survey");

    project
        .pf()
        .args(&["rollback", &id, "draft"])
        .exits_with(4)
        .stderr_has("rollback only moves backwards");
}

#[test]
fn rollback_to_unknown_stage_is_rejected() {
    let project = Project::demo();
    let id = project.init("survey");

    project.pf().args(&["rollback", &id, "review"]).exits_with(4);
}
