// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use pf_core::{ErrorKind, FieldType, Preferences, StageDef, StageRegistry, StageStatus};
use serde_json::json;
use tempfile::TempDir;

fn registry() -> StageRegistry {
    StageRegistry::new(vec![
        StageDef::new("search").require("query", FieldType::Any),
        StageDef::new("draft").require("text", FieldType::Text),
    ])
    .unwrap()
}

fn pipeline(id: &str) -> Pipeline {
    let mut prefs = Preferences::new();
    prefs.insert("language".to_string(), "en".to_string());
    Pipeline::new(id, "demo", &registry(), prefs, Utc::now())
}

fn store() -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path().join("pipelines")).unwrap();
    (dir, store)
}

#[test]
fn open_creates_directory() {
    let (dir, store) = store();
    assert!(dir.path().join("pipelines").is_dir());
    assert_eq!(store.base_path(), dir.path().join("pipelines"));
}

#[test]
fn save_then_load_round_trips() {
    let (_dir, store) = store();
    let mut original = pipeline("p-1");
    original.stages[0].status = StageStatus::Completed;
    original.stages[0]
        .output
        .insert("query".to_string(), json!({"terms": ["a", "b"], "limit": 5}));
    original.current_stage = "draft".into();

    store.save(&original).unwrap();
    let loaded = store.load(&original.id).unwrap();

    assert_eq!(loaded, original);
}

#[test]
fn load_missing_is_not_found() {
    let (_dir, store) = store();
    let err = store.load(&PipelineId::from("nope")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn exists_tracks_saved_records() {
    let (_dir, store) = store();
    let p = pipeline("p-1");
    assert!(!store.exists(&p.id));
    store.save(&p).unwrap();
    assert!(store.exists(&p.id));
}

#[test]
fn save_replaces_previous_record() {
    let (_dir, store) = store();
    let mut p = pipeline("p-1");
    store.save(&p).unwrap();
    p.name = "renamed".to_string();
    store.save(&p).unwrap();

    assert_eq!(store.load(&p.id).unwrap().name, "renamed");
}

#[test]
fn save_leaves_no_temp_file() {
    let (_dir, store) = store();
    store.save(&pipeline("p-1")).unwrap();

    let names: Vec<String> = fs::read_dir(store.base_path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["p-1.json"]);
}

#[test]
fn corrupt_file_is_reported_not_repaired() {
    let (_dir, store) = store();
    let id = PipelineId::from("p-1");
    fs::write(store.path_for(&id), "{\"schema_version\": 1, \"pipeline\": 3}").unwrap();

    let err = store.load(&id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptRecord);
    assert_eq!(
        fs::read_to_string(store.path_for(&id)).unwrap(),
        "{\"schema_version\": 1, \"pipeline\": 3}"
    );
}

#[test]
fn list_returns_sorted_ids() {
    let (_dir, store) = store();
    store.save(&pipeline("p-b")).unwrap();
    store.save(&pipeline("p-a")).unwrap();
    fs::write(store.base_path().join("notes.txt"), "ignored").unwrap();

    let ids = store.list().unwrap();
    assert_eq!(ids, vec![PipelineId::from("p-a"), PipelineId::from("p-b")]);
}

#[test]
fn delete_removes_record() {
    let (_dir, store) = store();
    let p = pipeline("p-1");
    store.save(&p).unwrap();
    drop(store.lock(&p.id).unwrap());

    store.delete(&p.id).unwrap();

    assert!(!store.exists(&p.id));
    assert!(matches!(
        store.delete(&p.id),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn path_like_ids_are_rejected() {
    let (_dir, store) = store();
    let id = PipelineId::from("../escape");
    assert!(!store.exists(&id));
    assert!(matches!(store.load(&id), Err(StoreError::NotFound { .. })));

    let mut p = pipeline("p-1");
    p.id = id;
    assert!(matches!(store.save(&p), Err(StoreError::Io { .. })));
}

#[test]
fn lock_is_file_backed_and_reacquirable() {
    let (_dir, store) = store();
    let id = PipelineId::from("p-1");

    let guard = store.lock(&id).unwrap();
    assert!(guard.is_file_lock());
    assert!(store.base_path().join("p-1.lock").exists());
    drop(guard);

    let again = store.lock(&id).unwrap();
    assert!(again.is_file_lock());
}

#[test]
fn lock_excludes_second_holder() {
    let (_dir, store) = store();
    let id = PipelineId::from("p-1");
    let _guard = store.lock(&id).unwrap();

    let other = File::open(store.base_path().join("p-1.lock")).unwrap();
    assert!(other.try_lock_exclusive().is_err());
}

fn with_metric(value: f64) -> Pipeline {
    let mut p = pipeline("p-1");
    p.stages[0]
        .output
        .insert("effect_size".to_string(), json!(value));
    p
}

#[test]
fn floats_round_trip_exactly() {
    let (_dir, store) = store();
    for value in [12.874560591713891, 1.0715660391465826e-75, 0.1 + 0.2, f64::MAX, f64::MIN_POSITIVE] {
        let p = with_metric(value);
        store.save(&p).unwrap();
        assert_eq!(store.load(&p.id).unwrap(), p, "value {value:e}");
    }
}

mod floats {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_finite_float_survives_save_and_load(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            let (_dir, store) = store();
            let p = with_metric(value);
            store.save(&p).unwrap();

            let loaded = store.load(&p.id).unwrap();
            let stored = loaded.stages[0].output["effect_size"].as_f64().unwrap();
            prop_assert_eq!(stored.to_bits(), value.to_bits());
        }
    }
}
