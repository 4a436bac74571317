//! On-disk record specs

use crate::prelude::*;

#[test]
fn record_is_versioned_json() {
    let project = Project::demo();
    let id = project.init("survey");

    let doc: Value = serde_json::from_str(&project.read(&format!(".paperflow/pipelines/{}.json", id))).unwrap();
    assert_eq!(doc["schema_version"], 1);
    assert_eq!(doc["pipeline"]["id"], id.as_str());
    let stages: Vec<&str> = doc["pipeline"]["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(stages, vec!["search", "outline", "draft"]);
}

#[test]
fn corrupt_record_exits_9() {
    let project = Project::demo();
    let id = project.init("survey");
    std::fs::write(project.record_path(&id), "{ truncated").unwrap();

    project
        .pf()
        .args(&["status", &id])
        .exits_with(9)
        .stderr_has("corrupt record")
        .stderr_has(&format!("pf delete {}", id));
}

#[test]
fn newer_schema_version_exits_9() {
    let project = Project::demo();
    let id = project.init("survey");
    let path = project.record_path(&id);
    let mut doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["schema_version"] = json!(99);
    std::fs::write(&path, doc.to_string()).unwrap();

    project
        .pf()
        .args(&["advance", &id, "--output", r#"{"query": "q"}"#])
        .exits_with(9)
        .stderr_has("schema version 99");
}

#[test]
fn record_from_other_workflow_is_corrupt() {
    let project = Project::empty();
    let id = project.init("paper");
    project.config(DEMO_CONFIG);

    project
        .pf()
        .args(&["status", &id])
        .exits_with(9)
        .stderr_has("does not match the stage registry");
}

#[test]
fn custom_store_dir() {
    let project = Project::empty();
    project.config(&format!("store_dir = \"state\"\n{}", DEMO_CONFIG));
    let id = project.init("survey");

    assert!(project.path().join("state").join(format!("{}.json", id)).exists());
    assert!(!project.record_path(&id).exists());
}

#[test]
fn log_file_receives_events() {
    let project = Project::empty();
    project.config(&format!("log_file = \"logs/pf.log\"\n{}", DEMO_CONFIG));
    let id = project.init("survey");

    let log = project.read("logs/pf.log");
    assert!(log.contains("pipeline:created"), "log was:\n{}", log);
    assert!(log.contains(&id));
}
