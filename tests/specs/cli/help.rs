//! Help and completion specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    let project = Project::empty();
    let run = project.pf().args(&["--help"]).passes();
    for command in ["init", "status", "advance", "run", "jump", "rollback", "validate"] {
        assert!(run.stdout().contains(command), "help missing {}", command);
    }
}

#[test]
fn version_prints_binary_name() {
    Project::empty()
        .pf()
        .args(&["--version"])
        .passes()
        .stdout_has("pf ");
}

#[test]
fn completions_for_bash() {
    Project::empty()
        .pf()
        .args(&["completions", "bash"])
        .passes()
        .stdout_has("_pf()");
}

#[test]
fn stages_lists_paper_workflow_by_default() {
    Project::empty()
        .pf()
        .args(&["stages"])
        .passes()
        .stdout_has("1. literature_review")
        .stdout_has("Literature review")
        .stdout_has("research_gap, key_papers, summary")
        .stdout_has("5. writing");
}

#[test]
fn stages_uses_configured_registry() {
    let project = Project::demo();
    let run = project.pf().args(&["--format", "json", "stages"]).passes();
    let ids: Vec<String> = run
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["search", "outline", "draft"]);
}
