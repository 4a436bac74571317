//! Jump specs
//!
//! Starting mid-sequence with earlier stages assumed complete.

use crate::prelude::*;

#[test]
fn jump_assumes_earlier_stages() {
    let project = Project::demo();
    let id = project.init("survey");

    project
        .pf()
        .args(&["jump", &id, "draft", "--assume", "search", "--assume", "outline"])
        .passes()
        .stdout_eq(&format!("Jumped: pipeline {} at stage 'draft' (pending)\n", id));

    let record = project.status(&id);
    assert_eq!(record["current_stage"], "draft");
    assert_eq!(record["stages"][0]["status"], "completed");
    assert_eq!(record["stages"][0]["output"], json!({}));
    assert_eq!(record["stages"][0]["attested"], true);
    assert_eq!(record["stages"][2]["status"], "pending");
}

#[test]
fn jump_with_gap_is_rejected() {
    let project = Project::demo();
    let id = project.init("survey");
    let before = project.read(&format!(".paperflow/pipelines/{}.json", id));

    project
        .pf()
        .args(&["jump", &id, "draft", "--assume", "search"])
        .exits_with(4)
        .stderr_has("'outline' precedes the target");

    let after = project.read(&format!(".paperflow/pipelines/{}.json", id));
    similar_asserts::assert_eq!(before, after);
}

#[test]
fn target_cannot_assume_itself() {
    let project = Project::demo();
    let id = project.init("survey");

    project
        .pf()
        .args(&["jump", &id, "draft", "--assume", "search", "--assume", "outline", "--assume", "draft"])
        .exits_with(4);
    assert_eq!(project.status(&id)["current_stage"], "search");
}

#[test]
fn assume_all_covers_every_earlier_stage() {
    let project = Project::demo();
    let id = project.init("survey");

    project
        .pf()
        .args(&["jump", &id, "draft", "--assume-all"])
        .passes();
    assert_eq!(project.stage_status(&id, "outline"), "completed");
}

#[test]
fn supplied_output_reaches_next_collaborator() {
    let project = Project::demo();
    let id = project.init("survey");
    let outline = project.file("given/outline.json", r#"{"points": ["intro", "method"]}"#);

    project
        .pf()
        .args(&[
            "jump",
            &id,
            "draft",
            "--assume-all",
            "--supply",
            &format!("outline={}", outline.display()),
        ])
        .passes();

    let input = project.pf().args(&["start", &id]).passes().json();
    assert_eq!(input["prior_outputs"]["outline"]["points"], json!(["intro", "method"]));
    assert_eq!(input["prior_outputs"]["search"], json!({}));
}

#[test]
fn jump_keeps_completed_stage_output() {
    let project = Project::demo();
    let id = project.init("survey");
    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "kept"}"#])
        .passes();

    project
        .pf()
        .args(&["jump", &id, "draft", "--assume", "outline"])
        .passes();

    let record = project.status(&id);
    assert_eq!(record["stages"][0]["output"]["query"], "kept");
    assert_eq!(record["stages"][0]["attested"], false);
}
