// src/engine.rs
//! # Engine Facade
//! The single entry point presentation code depends on: composes the news
//! store, the favorites store, and the normalizer behind one interface.
//!
//! Construction is explicit and async: `Engine::new` completes the
//! favorites `load()` before handing the engine out, so the first persist
//! can never race a cold start and zero out previously stored favorites.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::favorites::{FavoritesBackend, FavoritesStore, JsonFileBackend};
use crate::ingest;
use crate::ingest::types::{CandidateProducer, SearchSpec};
use crate::item::NewsItem;
use crate::news::NewsStore;

/// Result of a refresh/ingest attempt. A second attempt while one is in
/// flight is ignored, not an error: the in-flight operation is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed { kept: usize, dropped: usize },
    AlreadyRunning,
}

impl RefreshOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RefreshOutcome::Completed { .. })
    }
}

pub struct Engine {
    config: EngineConfig,
    news: RwLock<NewsStore>,
    favorites: tokio::sync::Mutex<FavoritesStore>,
    producer: Arc<dyn CandidateProducer>,
    refreshing: AtomicBool,
}

impl Engine {
    /// Build an engine persisting favorites to `config.storage_path`.
    pub async fn new(config: EngineConfig, producer: Arc<dyn CandidateProducer>) -> Self {
        let backend = Box::new(JsonFileBackend::new(&config.storage_path));
        Self::with_backend(config, producer, backend).await
    }

    /// Build an engine over an arbitrary storage backend. Completes the
    /// favorites load before returning.
    pub async fn with_backend(
        config: EngineConfig,
        producer: Arc<dyn CandidateProducer>,
        backend: Box<dyn FavoritesBackend>,
    ) -> Self {
        let mut favorites = FavoritesStore::new(backend, config.expiry_hours);
        favorites.load().await;
        Self {
            config,
            news: RwLock::new(NewsStore::new()),
            favorites: tokio::sync::Mutex::new(favorites),
            producer,
            refreshing: AtomicBool::new(false),
        }
    }

    // ---- Ingestion ----

    /// Fetch a fresh batch from the producer and replace the working news
    /// set with it. While the fetch is in flight `is_loading()` is true and
    /// any further `refresh`/`ingest` call returns `AlreadyRunning`.
    ///
    /// A batch-level failure (producer error or unparseable payload) leaves
    /// the news store untouched and surfaces the reason to the caller.
    pub async fn refresh(&self, spec: &SearchSpec) -> Result<RefreshOutcome> {
        if !self.begin_refresh() {
            return Ok(RefreshOutcome::AlreadyRunning);
        }
        self.news_mut(|news| news.set_loading(true));

        let result = match self.producer.search(spec).await {
            Ok(raw) => self.commit_raw(&raw),
            Err(e) => {
                warn!(producer = self.producer.name(), error = ?e, "producer fetch failed");
                Err(e.context(format!("fetching candidates from {}", self.producer.name())))
            }
        };

        self.news_mut(|news| news.set_loading(false));
        self.end_refresh();
        result.map(|(kept, dropped)| RefreshOutcome::Completed { kept, dropped })
    }

    /// Normalize an already-received raw batch and replace the working news
    /// set. Subject to the same in-flight gate as `refresh`, so a direct
    /// ingest can never interleave with an in-flight refresh.
    pub async fn ingest(&self, raw: &str) -> Result<RefreshOutcome> {
        if !self.begin_refresh() {
            return Ok(RefreshOutcome::AlreadyRunning);
        }
        let result = self.commit_raw(raw);
        self.end_refresh();
        result.map(|(kept, dropped)| RefreshOutcome::Completed { kept, dropped })
    }

    /// Prepend already-normalized items to the working set.
    pub fn append_items(&self, items: Vec<NewsItem>) {
        self.news_mut(|news| news.append(items));
    }

    /// Replace the working set with already-normalized items.
    pub fn replace_items(&self, items: Vec<NewsItem>) {
        self.news_mut(|news| news.replace(items));
    }

    fn commit_raw(&self, raw: &str) -> Result<(usize, usize)> {
        let candidates = ingest::parse_batch(raw)?;
        let total = candidates.len();
        let items = ingest::normalize_batch(candidates, &self.config);
        let kept = items.len();
        let dropped = total - kept;
        self.news_mut(|news| news.replace(items));
        info!(kept, dropped, "news set replaced");
        Ok((kept, dropped))
    }

    // ---- Favorites ----

    /// Toggle `item` in the favorites set; returns true when it was added.
    /// Toggles are serialized, so two calls in quick succession persist in
    /// issue order and the last write reflects both.
    pub async fn toggle_favorite(&self, item: &NewsItem) -> Result<bool> {
        let mut favorites = self.favorites.lock().await;
        favorites.toggle(item).await
    }

    pub async fn is_favorite(&self, id: &str) -> bool {
        self.favorites.lock().await.is_favorite(id)
    }

    pub async fn favorites(&self) -> Vec<NewsItem> {
        self.favorites.lock().await.snapshot()
    }

    // ---- Read-only views ----

    pub fn news(&self) -> Vec<NewsItem> {
        self.news_ref(|news| news.items())
    }

    pub fn is_loading(&self) -> bool {
        self.news_ref(|news| news.is_loading())
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.news_ref(|news| news.last_updated())
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.news_ref(|news| news.subscribe())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- Internals ----

    fn begin_refresh(&self) -> bool {
        let acquired = self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if !acquired {
            info!(
                producer = self.producer.name(),
                "ingestion already in flight; ignoring"
            );
        }
        acquired
    }

    fn end_refresh(&self) {
        self.refreshing.store(false, Ordering::SeqCst);
    }

    fn news_ref<T>(&self, f: impl FnOnce(&NewsStore) -> T) -> T {
        f(&self.news.read().expect("news lock poisoned"))
    }

    fn news_mut<T>(&self, f: impl FnOnce(&mut NewsStore) -> T) -> T {
        f(&mut self.news.write().expect("news lock poisoned"))
    }
}
