//! Tests of the correction feedback loop: learning from edited transcripts,
//! normalization against the learned dictionary, and durable persistence.

mod common;

use common::engine_for;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use voice_capture::{
    capability::{ScriptStep, ScriptedCapability},
    learner::CorrectionLearner,
    normalize::normalize,
    store::{CorrectionStore, JsonFileStore, MemoryStore, REPLACEMENTS_KEY},
    KeyValueStore,
};

#[tokio::test(start_paused = true)]
async fn test_learned_corrections_apply_to_next_capture() {
    let capability = ScriptedCapability::new(vec![ScriptStep::finalized(
        Duration::from_millis(50),
        "one lite milk",
    )]);
    let engine = engine_for(capability);

    let learned = engine.learn_from_edit("one lite milk", "one litre milk").await;
    assert_eq!(learned, 1);

    let (tx, _rx) = mpsc::unbounded_channel();
    engine.start_capture(tx).await.unwrap();
    let outcome = engine.finish().await.unwrap();

    assert_eq!(outcome.raw_transcript, "one lite milk");
    assert_eq!(outcome.transcript, "One litre milk");
}

#[tokio::test]
async fn test_misaligned_edit_changes_nothing() {
    let store = Arc::new(CorrectionStore::new(MemoryStore::new()));
    let learner = CorrectionLearner::new(store.clone());

    // An inserted word makes the alignment ambiguous; nothing is learned.
    assert_eq!(learner.learn("one lite milk", "one full litre milk").await, 0);
    assert!(store.is_empty().await);

    let corrections = store.load_all().await;
    assert_eq!(normalize("one lite milk", &corrections), "One lite milk");
}

#[tokio::test]
async fn test_dictionary_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = Arc::new(CorrectionStore::new(JsonFileStore::new(dir.path())));
        let learner = CorrectionLearner::new(store);
        assert_eq!(learner.learn("to melk", "two milk").await, 2);
    }

    // A fresh store over the same directory sees the learned entries.
    let store = CorrectionStore::new(JsonFileStore::new(dir.path()));
    assert_eq!(store.lookup("to").await, Some("two".to_string()));
    assert_eq!(store.lookup("melk").await, Some("milk".to_string()));

    let corrections = store.load_all().await;
    assert_eq!(normalize("to melk", &corrections), "Two milk");
}

#[tokio::test]
async fn test_persisted_payload_is_the_full_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let kv = JsonFileStore::new(dir.path());

    let store = CorrectionStore::new(kv.clone());
    store
        .upsert(voice_capture::CorrectionEntry::new("lite", "litre"))
        .await;
    store
        .upsert(voice_capture::CorrectionEntry::new("melk", "milk"))
        .await;

    let payload = kv.load(REPLACEMENTS_KEY).await.unwrap().unwrap();
    let mapping: std::collections::HashMap<String, String> =
        serde_json::from_str(&payload).unwrap();
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping.get("lite").map(String::as_str), Some("litre"));
    assert_eq!(mapping.get("melk").map(String::as_str), Some("milk"));
}

#[tokio::test]
async fn test_concurrent_learns_all_land() {
    let store = Arc::new(CorrectionStore::new(MemoryStore::new()));

    let mut handles = Vec::new();
    for i in 0..16 {
        let learner = CorrectionLearner::new(store.clone());
        handles.push(tokio::spawn(async move {
            let original = format!("word{i}");
            let corrected = format!("fixed{i}");
            learner.learn(&original, &corrected).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 1);
    }

    assert_eq!(store.len().await, 16);
    assert_eq!(store.lookup("word7").await, Some("fixed7".to_string()));
}

#[tokio::test]
async fn test_repeated_learning_last_write_wins() {
    let store = Arc::new(CorrectionStore::new(MemoryStore::new()));
    let learner = CorrectionLearner::new(store.clone());

    learner.learn("melk", "milk").await;
    learner.learn("melk", "silk").await;

    assert_eq!(store.lookup("melk").await, Some("silk".to_string()));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_failed_persistence_does_not_break_capture_path() {
    let kv = MemoryStore::new();
    kv.fail_saves(true);
    let store = Arc::new(CorrectionStore::new(kv));
    let learner = CorrectionLearner::new(store.clone());

    // The save fails but the session keeps its in-memory corrections.
    assert_eq!(learner.learn("lite", "litre").await, 1);
    let corrections = store.load_all().await;
    assert_eq!(normalize("one lite milk", &corrections), "One litre milk");
}
