// src/lib.rs
// Public library surface for the dashboard engine (and integration tests).

pub mod config;
pub mod engine;
pub mod favorites;
pub mod ingest;
pub mod item;
pub mod news;

// ---- Re-exports for stable public API ----
pub use crate::config::EngineConfig;
pub use crate::engine::{Engine, RefreshOutcome};
pub use crate::favorites::{FavoritesBackend, FavoritesStore, JsonFileBackend};
pub use crate::ingest::types::{CandidateProducer, RawCandidate, SearchSpec};
pub use crate::item::NewsItem;
