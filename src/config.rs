// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::favorites::DEFAULT_EXPIRY_HOURS;

const ENV_PATH: &str = "FUNDNEWS_CONFIG_PATH";

pub const DEFAULT_STORAGE_PATH: &str = "fundnews_favorites.json";
pub const DEFAULT_SEARCH_BASE: &str = "https://www.google.com/search?q=";
pub const DEFAULT_IMAGE_BASE: &str = "https://source.unsplash.com/800x600/?finance,stock,";

/// Engine configuration, loaded from TOML or JSON. Every field has a
/// default so a partial (or absent) config file is fine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Where the favorites collection is persisted.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    /// Hours a favorited item survives before load-time auto-cleanup.
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    /// Prefix for synthesized search-fallback links.
    #[serde(default = "default_search_base")]
    pub search_base: String,
    /// Prefix for placeholder images; the candidate's batch position is
    /// appended to keep images distinct within a batch.
    #[serde(default = "default_image_base")]
    pub image_base: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_PATH)
}
fn default_expiry_hours() -> u64 {
    DEFAULT_EXPIRY_HOURS
}
fn default_search_base() -> String {
    DEFAULT_SEARCH_BASE.to_string()
}
fn default_image_base() -> String {
    DEFAULT_IMAGE_BASE.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            expiry_hours: default_expiry_hours(),
            search_base: default_search_base(),
            image_base: default_image_base(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from an explicit path. Supports TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_config(&content, ext.as_str())
    }

    /// Load configuration using env var + fallbacks:
    /// 1) $FUNDNEWS_CONFIG_PATH
    /// 2) config/fundnews.toml
    /// 3) config/fundnews.json
    /// 4) built-in defaults
    ///
    /// Never fails: a missing or unparseable config logs a warning and
    /// falls back to defaults, so startup cannot be blocked by config.
    pub fn load_default() -> Self {
        let candidates: Vec<PathBuf> = std::env::var(ENV_PATH)
            .map(|p| vec![PathBuf::from(p)])
            .unwrap_or_else(|_| {
                vec![
                    PathBuf::from("config/fundnews.toml"),
                    PathBuf::from("config/fundnews.json"),
                ]
            });

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(error = ?e, path = %path.display(), "bad engine config; using defaults");
                    return Self::default();
                }
            }
        }
        Self::default()
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<EngineConfig> {
    if hint_ext == "toml" {
        if let Ok(cfg) = toml::from_str(s) {
            return Ok(cfg);
        }
    }
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }
    if hint_ext != "toml" {
        if let Ok(cfg) = toml::from_str(s) {
            return Ok(cfg);
        }
    }
    Err(anyhow!("unsupported engine config format"))
}
