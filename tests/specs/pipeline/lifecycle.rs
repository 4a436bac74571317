//! Pipeline lifecycle specs
//!
//! Create, advance through every stage, and fail validation.

use crate::prelude::*;

const TWO_STAGES: &str = r#"
[[stage]]
id = "search"
[[stage.field]]
name = "query"

[[stage]]
id = "draft"
[[stage.field]]
name = "text"
type = "text"
"#;

fn two_stage_project() -> Project {
    let project = Project::empty();
    project.config(TWO_STAGES);
    project
}

#[test]
fn init_starts_at_first_stage() {
    let project = two_stage_project();
    let run = project.pf().args(&["init", "demo"]).passes();
    assert!(run.stdout().starts_with("Created pipeline demo-"));
    run.stdout_has("Current stage: search");
}

#[test]
fn init_records_preferences() {
    let project = Project::empty();
    let id = project.init("citation retrieval");
    let record = project.status(&id);
    assert_eq!(record["preferences"]["discipline"], "cs");

    let run = project
        .pf()
        .args(&[
            "--format", "json", "init", "survey", "--discipline", "bio", "--pref", "venue=ISMB",
        ])
        .passes();
    let record = run.json();
    assert_eq!(record["preferences"]["discipline"], "bio");
    assert_eq!(record["preferences"]["venue"], "ISMB");
    assert_eq!(record["current_stage"], "literature_review");
}

#[test]
fn valid_output_advances_to_next_stage() {
    let project = two_stage_project();
    let id = project.init("demo");

    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "x"}"#])
        .passes()
        .stdout_eq("Stage 'search' completed\nCurrent stage: draft\n");

    let record = project.status(&id);
    assert_eq!(record["current_stage"], "draft");
    assert_eq!(project.stage_status(&id, "search"), "completed");
}

#[test]
fn missing_field_fails_stage_and_exits_5() {
    let project = two_stage_project();
    let id = project.init("demo");
    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "x"}"#])
        .passes();

    project
        .pf()
        .args(&["advance", &id, "--output", "{}"])
        .exits_with(5)
        .stdout_eq("Stage 'draft' failed validation: missing: text\n")
        .stderr_has("-> missing field: text");

    let record = project.status(&id);
    assert_eq!(record["current_stage"], "draft");
    assert_eq!(project.stage_status(&id, "draft"), "failed");
    assert_eq!(record["stages"][1]["error"]["kind"], "validation");
    assert_eq!(record["stages"][1]["error"]["missing"], json!(["text"]));
}

#[test]
fn failed_stage_needs_start_before_new_output() {
    let project = two_stage_project();
    let id = project.init("demo");
    project.pf().args(&["advance", &id, "--output", "{}"]).exits_with(5);

    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "x"}"#])
        .exits_with(4)
        .stderr_has("dispatch it again");

    let input = project.pf().args(&["start", &id]).passes().json();
    assert_eq!(input["stage"], "search");
    assert_eq!(input["pipeline_id"], id.as_str());

    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "x"}"#])
        .passes();
    assert_eq!(project.status(&id)["stages"][0]["attempts"], 1);
}

#[test]
fn completed_stage_rejects_more_output() {
    let project = two_stage_project();
    let id = project.init("demo");
    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "x"}"#])
        .passes();
    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"text": "done"}"#])
        .passes()
        .stdout_has(&format!("Pipeline {} complete", id));

    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"text": "again"}"#])
        .exits_with(4);
}

#[test]
fn start_passes_prior_outputs() {
    let project = two_stage_project();
    let id = project.init("demo");
    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "graph retrieval"}"#])
        .passes();

    let input = project.pf().args(&["start", &id]).passes().json();
    assert_eq!(input["stage"], "draft");
    assert_eq!(input["prior_outputs"]["search"]["query"], "graph retrieval");
    assert_eq!(project.stage_status(&id, "draft"), "in_progress");
}

#[test]
fn output_file_is_accepted() {
    let project = two_stage_project();
    let id = project.init("demo");
    let path = project.file("out/search.json", r#"{"query": "from file"}"#);

    project
        .pf()
        .args(&["advance", &id, "--output-file", path.to_str().unwrap()])
        .passes();
    assert_eq!(project.status(&id)["stages"][0]["output"]["query"], "from file");
}

#[test]
fn fail_marks_current_stage() {
    let project = two_stage_project();
    let id = project.init("demo");

    project
        .pf()
        .args(&["fail", &id, "search API quota exhausted"])
        .passes()
        .stdout_eq(&format!(
            "Marked stage failed: pipeline {} at stage 'search' (failed)\n",
            id
        ));
    let record = project.status(&id);
    assert_eq!(record["stages"][0]["error"]["message"], "search API quota exhausted");
}

#[test]
fn full_paper_workflow() {
    let project = Project::empty();
    let id = project.init("citation retrieval");
    let outputs = [
        json!({
            "research_gap": "Existing retrieval models ignore citation context when ranking related work.",
            "key_papers": ["a", "b", "c", "d", "e"],
            "summary": "Five papers on citation-aware retrieval.",
        }),
        json!({
            "hypotheses": ["citation context improves ranking"],
            "experiment_designs": ["ablation on context window"],
            "feasibility": {"data": "public corpus", "method": "fine-tuning"},
        }),
        json!({"repo_url": "https://example.org/repo", "config": {"lr": 0.001}}),
        json!({"results": {"ndcg": 0.41}, "tables": ["table 1"], "analysis": "context helps"}),
        json!({
            "sections": {
                "abstract": "a", "introduction": "i", "method": "m",
                "experiments": "e", "conclusion": "c",
            },
            "drafts": ["v1"],
        }),
    ];
    for output in outputs {
        project
            .pf()
            .args(&["advance", &id, "--output", &output.to_string()])
            .passes();
    }

    project
        .pf()
        .args(&["status", &id])
        .passes()
        .stdout_has("(pipeline complete)")
        .stdout_has("5 key papers")
        .stdout_has("https://example.org/repo (inline config)")
        .stdout_has("5 sections, 1 drafts");

    let run = project.pf().args(&["validate", &id]).passes();
    assert_eq!(run.stdout().matches(" ok\n").count(), 5);
}
