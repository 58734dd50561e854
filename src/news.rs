// src/news.rs
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::item::NewsItem;

/// The in-memory working set of news items plus freshness metadata.
///
/// Contents are created by `replace`/`append`, never mutated in place, and
/// discarded wholesale on the next `replace` or on restart; there is no
/// persistence here. All operations are total over well-formed input;
/// validity is the normalizer's contract, not ours.
#[derive(Debug)]
pub struct NewsStore {
    items: Vec<NewsItem>,
    last_updated: Option<DateTime<Utc>>,
    loading: bool,
    revision: watch::Sender<u64>,
}

impl NewsStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            items: Vec::new(),
            last_updated: None,
            loading: false,
            revision,
        }
    }

    /// The collection becomes exactly `items`, order preserved.
    pub fn replace(&mut self, items: Vec<NewsItem>) {
        self.items = items;
        self.touch();
    }

    /// Prepend `items` (most-recent-first is a caller convention, not
    /// enforced here). Deliberately no dedup by id: callers own duplicate
    /// avoidance across refreshes.
    pub fn append(&mut self, items: Vec<NewsItem>) {
        let mut merged = items;
        merged.append(&mut self.items);
        self.items = merged;
        self.touch();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.notify();
    }

    pub fn items(&self) -> Vec<NewsItem> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Subscribers observe a bumped revision after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
        self.notify();
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for NewsStore {
    fn default() -> Self {
        Self::new()
    }
}
