// tests/favorites_store.rs
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Duration, Utc};
use fundnews_engine::favorites::{FavoritesBackend, FavoritesStore, JsonFileBackend};
use fundnews_engine::NewsItem;

/// In-memory backend that records every write, so tests can assert on what
/// got persisted and in which order.
struct RecordingBackend {
    seed: Option<String>,
    writes: Mutex<Vec<String>>,
}

impl RecordingBackend {
    fn new(seed: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            seed: seed.map(str::to_string),
            writes: Mutex::new(vec![]),
        })
    }
}

/// Local handle implementing the engine's backend trait; the recording
/// state itself stays shared behind the `Arc` so tests can inspect it.
struct SharedBackend(Arc<RecordingBackend>);

#[async_trait::async_trait]
impl FavoritesBackend for SharedBackend {
    async fn read(&self) -> Result<Option<String>> {
        Ok(self.0.seed.clone())
    }
    async fn write(&self, payload: String) -> Result<()> {
        self.0.writes.lock().unwrap().push(payload);
        Ok(())
    }
}

fn store_over(backend: &Arc<RecordingBackend>) -> FavoritesStore {
    FavoritesStore::new(Box::new(SharedBackend(backend.clone())), 72)
}

fn mk(id: &str) -> NewsItem {
    NewsItem {
        id: id.to_string(),
        title: format!("title {id}"),
        summary: "summary".into(),
        image_url: "img".into(),
        source: "Reuters".into(),
        time: "2 hours ago".into(),
        tags: vec!["Policy".into()],
        is_top_story: false,
        url: Some("https://example.test/story".into()),
        saved_at: None,
    }
}

fn mk_saved(id: &str, hours_ago: i64) -> NewsItem {
    let mut item = mk(id);
    item.saved_at = Some((Utc::now() - Duration::hours(hours_ago)).to_rfc3339());
    item
}

#[tokio::test]
async fn toggle_is_involutive_and_flips_membership_once() {
    let mut store = store_over(&RecordingBackend::new(None));
    store.load().await;

    let item = mk("a");
    assert!(!store.is_favorite("a"));

    assert!(store.toggle(&item).await.unwrap());
    assert!(store.is_favorite("a"));
    assert!(store.snapshot()[0].saved_at.is_some());

    assert!(!store.toggle(&item).await.unwrap());
    assert!(!store.is_favorite("a"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn toggling_same_id_never_duplicates() {
    let mut store = store_over(&RecordingBackend::new(None));
    store.load().await;

    // Same logical item arriving twice (e.g. across refreshes).
    store.toggle(&mk("a")).await.unwrap();
    store.toggle(&mk("b")).await.unwrap();
    store.toggle(&mk("a")).await.unwrap(); // removes, not duplicates
    store.toggle(&mk("a")).await.unwrap(); // re-adds

    let ids: Vec<_> = store.snapshot().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn every_toggle_persists_the_full_collection_in_order() {
    let backend = RecordingBackend::new(None);
    let mut store = store_over(&backend);
    store.load().await;

    store.toggle(&mk("a")).await.unwrap();
    store.toggle(&mk("b")).await.unwrap();

    let writes = backend.writes.lock().unwrap();
    assert_eq!(writes.len(), 2);
    assert!(writes[0].contains("\"a\"") && !writes[0].contains("\"b\""));
    assert!(writes[1].contains("\"a\"") && writes[1].contains("\"b\""));
}

#[tokio::test]
async fn load_prunes_expired_keeps_fresh_and_legacy() {
    let stored = vec![mk_saved("old", 100), mk_saved("fresh", 1), mk("legacy")];
    let seed = serde_json::to_string(&stored).unwrap();
    let mut store = store_over(&RecordingBackend::new(Some(&seed)));

    let expired = store.load().await;
    assert_eq!(expired, 1);
    assert!(!store.is_favorite("old"));
    assert!(store.is_favorite("fresh"));
    assert!(store.is_favorite("legacy"));
}

#[tokio::test]
async fn load_never_writes_over_existing_data() {
    let stored = vec![mk_saved("a", 100), mk_saved("b", 1)];
    let seed = serde_json::to_string(&stored).unwrap();
    let backend = RecordingBackend::new(Some(&seed));
    let mut store = store_over(&backend);

    store.load().await;
    // Pruning happened in memory only; storage is untouched until the next
    // user mutation.
    assert!(backend.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_payload_degrades_to_empty_without_failing() {
    let mut store = store_over(&RecordingBackend::new(Some("{definitely not json")));
    let expired = store.load().await;
    assert_eq!(expired, 0);
    assert!(store.is_empty());

    // The store stays usable afterwards.
    assert!(store.toggle(&mk("a")).await.unwrap());
    assert!(store.is_favorite("a"));
}

#[tokio::test]
async fn file_backend_round_trips_within_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");

    let mut first = FavoritesStore::new(Box::new(JsonFileBackend::new(&path)), 72);
    first.load().await;
    first.toggle(&mk("a")).await.unwrap();
    first.toggle(&mk("b")).await.unwrap();
    let written = first.snapshot();

    let mut second = FavoritesStore::new(Box::new(JsonFileBackend::new(&path)), 72);
    let expired = second.load().await;
    assert_eq!(expired, 0);
    assert_eq!(second.snapshot(), written);
}

#[tokio::test]
async fn absent_file_is_a_valid_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never_written.json");

    let mut store = FavoritesStore::new(Box::new(JsonFileBackend::new(&path)), 72);
    store.load().await;
    assert!(store.is_empty());
    assert!(!path.exists());
}
