// src/favorites.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::item::NewsItem;

/// Favorited items expire this long after being saved.
pub const DEFAULT_EXPIRY_HOURS: u64 = 72;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "favorites_expired_total",
            "Favorites auto-cleaned at load for exceeding the expiry window."
        );
        describe_counter!(
            "favorites_corrupt_loads_total",
            "Persisted favorites payloads that failed to parse."
        );
    });
}

/// Durable key-value storage for the favorites collection. One logical key
/// holds the entire serialized collection; `None` on read means the key was
/// never written, which is a valid empty state.
#[async_trait::async_trait]
pub trait FavoritesBackend: Send + Sync {
    async fn read(&self) -> Result<Option<String>>;
    /// Overwrite the whole persisted collection.
    async fn write(&self, payload: String) -> Result<()>;
}

/// File-based backend: the collection lives in a single JSON file.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl FavoritesBackend for JsonFileBackend {
    async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("reading favorites from {}", self.path.display()))
            }
        }
    }

    async fn write(&self, payload: String) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        tokio::fs::write(&self.path, payload)
            .await
            .with_context(|| format!("writing favorites to {}", self.path.display()))
    }
}

/// Persistent, deduplicated, self-expiring set of saved items.
///
/// Membership is keyed solely by `id`. Every successful mutation re-persists
/// the full collection before returning; `load` never writes, so a cold
/// start can never clobber previously stored favorites with an empty set.
pub struct FavoritesStore {
    backend: Box<dyn FavoritesBackend>,
    items: Vec<NewsItem>,
    expiry: Duration,
}

impl FavoritesStore {
    pub fn new(backend: Box<dyn FavoritesBackend>, expiry_hours: u64) -> Self {
        Self {
            backend,
            items: Vec::new(),
            expiry: Duration::hours(expiry_hours as i64),
        }
    }

    /// Populate in-memory state from storage, pruning expired entries.
    /// Returns the number of entries auto-cleaned.
    ///
    /// Unreadable or corrupt payloads degrade to an empty store with a
    /// diagnostic log; they must never block application start. Expired
    /// entries are dropped silently and simply not included in the next
    /// persist; expiry is evaluated here only, never while running.
    pub async fn load(&mut self) -> usize {
        ensure_metrics_described();

        let raw = match self.backend.read().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = ?e, "favorites storage unreadable; starting empty");
                counter!("favorites_corrupt_loads_total").increment(1);
                return 0;
            }
        };
        let Some(raw) = raw else {
            return 0;
        };

        let stored: Vec<NewsItem> = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "persisted favorites corrupt; starting empty");
                counter!("favorites_corrupt_loads_total").increment(1);
                return 0;
            }
        };

        let (kept, expired) = retain_unexpired(stored, Utc::now(), self.expiry);
        if expired > 0 {
            info!(expired, "auto-cleaned expired favorites");
            counter!("favorites_expired_total").increment(expired as u64);
        }
        self.items = kept;
        expired
    }

    /// Add `item` to the favorites (stamping `saved_at`), or remove it if an
    /// entry with the same id already exists. Returns true when the item was
    /// added. The resulting collection is persisted before returning.
    pub async fn toggle(&mut self, item: &NewsItem) -> Result<bool> {
        let added = match self.items.iter().position(|f| f.id == item.id) {
            Some(pos) => {
                self.items.remove(pos);
                false
            }
            None => {
                let mut saved = item.clone();
                saved.saved_at = Some(Utc::now().to_rfc3339());
                self.items.push(saved);
                true
            }
        };
        self.persist().await?;
        Ok(added)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.items.iter().any(|f| f.id == id)
    }

    pub fn snapshot(&self) -> Vec<NewsItem> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    async fn persist(&self) -> Result<()> {
        let payload =
            serde_json::to_string(&self.items).context("serializing favorites collection")?;
        self.backend.write(payload).await
    }
}

/// Split stored items into (kept, expired_count).
///
/// Items without `saved_at` are legacy entries and are kept unconditionally.
/// An item with a `saved_at` is kept only if strictly younger than `expiry`;
/// a malformed timestamp can never satisfy that check, so it expires.
fn retain_unexpired(
    items: Vec<NewsItem>,
    now: DateTime<Utc>,
    expiry: Duration,
) -> (Vec<NewsItem>, usize) {
    let before = items.len();
    let kept: Vec<NewsItem> = items
        .into_iter()
        .filter(|item| match item.saved_at.as_deref() {
            None => true,
            Some(ts) => match DateTime::parse_from_rfc3339(ts) {
                Ok(saved) => now.signed_duration_since(saved.with_timezone(&Utc)) < expiry,
                Err(_) => false,
            },
        })
        .collect();
    let expired = before - kept.len();
    (kept, expired)
}
