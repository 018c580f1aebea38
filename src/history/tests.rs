use super::models::{HistoryFill, PlotHistoryEntry};
use super::services::{PlotHistoryLookup, merge_history, normalize_plot_id};
use crate::config::Config;
use crate::samples::models::SampleDraft;
use crate::store::{MemoryStore, SubmissionStore};
use serde_json::json;
use std::sync::Arc;

fn entry(crop: &str, previous_crop: &str, yield_goal: &str) -> PlotHistoryEntry {
    PlotHistoryEntry {
        crop: Some(crop.to_string()),
        previous_crop: Some(previous_crop.to_string()),
        yield_goal: Some(yield_goal.to_string()),
        ..PlotHistoryEntry::default()
    }
}

fn store_with_history() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_plot_history("A1234", entry("Wheat", "Corn", "80"));
    store.insert_plot_history("A1234", entry("Soybeans", "Wheat", "60"));
    store.insert_plot_history("B2345", entry("Corn", "Soybeans", "220"));
    store
}

fn lookup(store: &Arc<MemoryStore>, config: &Config) -> PlotHistoryLookup {
    let store: Arc<dyn SubmissionStore> = store.clone();
    PlotHistoryLookup::new(store, config)
}

#[test]
fn test_merge_fills_only_empty_fields() {
    let mut sample = SampleDraft {
        crop: "Alfalfa".to_string(),
        ..SampleDraft::default()
    };
    let fill = merge_history(&mut sample, &entry("Corn", "Soybeans", "220"));

    assert_eq!(
        fill,
        HistoryFill {
            crop: false,
            previous_crop: true,
            yield_goal: true,
        }
    );
    assert_eq!(sample.crop, "Alfalfa");
    assert_eq!(sample.previous_crop, "Soybeans");
    assert_eq!(sample.yield_goal, "220");
}

#[test]
fn test_merge_ignores_blank_history_values() {
    let mut sample = SampleDraft::default();
    let fill = merge_history(&mut sample, &entry(" ", "", "180"));
    assert!(!fill.crop);
    assert!(!fill.previous_crop);
    assert!(fill.any());
    assert!(sample.crop.is_empty());
}

#[test]
fn test_history_entry_accepts_numeric_yield() {
    let entry: PlotHistoryEntry = serde_json::from_value(json!({
        "batch_id": "B-1",
        "crop": "Corn",
        "yield_goal": 220,
        "grower": null
    }))
    .unwrap();
    assert_eq!(entry.yield_goal.as_deref(), Some("220"));
    assert_eq!(entry.grower, None);
}

#[test]
fn test_normalize_plot_id() {
    assert_eq!(normalize_plot_id("  a1234 "), "A1234");
}

#[tokio::test]
async fn test_lookup_uses_most_recent_entry() {
    let store = store_with_history();
    let mut lookup = lookup(&store, &Config::for_tests());

    assert!(lookup.request(0, "a1234"));
    assert!(lookup.is_pending(0));
    let (key, found) = lookup.finish(0).await.unwrap();

    assert_eq!(key.plot_id, "A1234");
    assert_eq!(key.sample_index, 0);
    assert_eq!(found.crop.as_deref(), Some("Soybeans"));
    assert!(!lookup.is_pending(0));
}

#[tokio::test]
async fn test_short_plot_ids_are_not_looked_up() {
    let store = store_with_history();
    let mut lookup = lookup(&store, &Config::for_tests());

    assert!(!lookup.request(0, " A1 "));
    assert!(!lookup.is_pending(0));
    assert!(lookup.finish(0).await.is_none());
}

#[tokio::test]
async fn test_newer_request_supersedes_older_one() {
    let store = store_with_history();
    let mut lookup = lookup(&store, &Config::for_tests());

    lookup.request(0, "A1234");
    lookup.request(0, "B2345");
    let (key, found) = lookup.finish(0).await.unwrap();
    assert_eq!(key.plot_id, "B2345");
    assert_eq!(found.crop.as_deref(), Some("Corn"));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_lookup_yields_nothing() {
    let store = store_with_history();
    let config = Config {
        history_debounce_ms: 500,
        ..Config::for_tests()
    };
    let mut lookup = lookup(&store, &config);

    lookup.request(2, "A1234");
    lookup.cancel(2);
    assert!(!lookup.is_pending(2));
    assert!(lookup.finish(2).await.is_none());
}

#[tokio::test]
async fn test_unknown_plot_and_failed_lookup_yield_nothing() {
    let store = store_with_history();
    let mut lookup = lookup(&store, &Config::for_tests());

    lookup.request(0, "Q0000");
    assert!(lookup.finish(0).await.is_none());

    store.set_offline(true);
    lookup.request(0, "A1234");
    assert!(lookup.finish(0).await.is_none());
}

#[tokio::test]
async fn test_removing_a_sample_rekeys_later_lookups() {
    let store = store_with_history();
    let mut lookup = lookup(&store, &Config::for_tests());

    lookup.request(0, "A1234");
    lookup.request(1, "B2345");
    lookup.sample_removed(0);

    assert!(lookup.is_pending(0));
    assert!(!lookup.is_pending(1));
    assert_eq!(lookup.pending_key(0).unwrap().plot_id, "B2345");
    let (key, _) = lookup.finish(0).await.unwrap();
    assert_eq!(key.sample_index, 0);
}

#[tokio::test(start_paused = true)]
async fn test_removing_a_sample_keeps_every_later_lookup() {
    let store = store_with_history();
    let config = Config {
        history_debounce_ms: 500,
        ..Config::for_tests()
    };
    let mut lookup = lookup(&store, &config);

    for (index, plot_id) in ["A1234", "C3456", "B2345", "D4567"].iter().enumerate() {
        lookup.request(index, plot_id);
    }
    lookup.sample_removed(1);

    let keys: Vec<&str> = (0..3)
        .map(|index| lookup.pending_key(index).unwrap().plot_id.as_str())
        .collect();
    assert_eq!(keys, ["A1234", "B2345", "D4567"]);
    assert!(!lookup.is_pending(3));
    lookup.cancel_all();
}
