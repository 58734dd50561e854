// src/ingest/types.rs
use anyhow::Result;

/// One unvalidated candidate as handed over by the external producer.
/// Every field is optional from the producer's point of view; the
/// normalizer repairs or defaults whatever is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: String,
    pub summary: String,
    pub source: Option<String>,
    pub time: Option<String>,
    pub tags: Vec<String>,
    pub is_top_story: bool,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// What the producer should search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    /// Free-text keywords; empty means "use the broad default query".
    pub keywords: String,
    /// Number of distinct stories to request.
    pub count: usize,
    /// Human-readable recency window, e.g. "24 hours".
    pub time_range: String,
}

impl Default for SearchSpec {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            count: 6,
            time_range: "24 hours".to_string(),
        }
    }
}

impl SearchSpec {
    pub fn query(&self) -> &str {
        if self.keywords.trim().is_empty() {
            "US Stock Market Funds, ETFs, and Major Tech Stocks"
        } else {
            &self.keywords
        }
    }
}

/// External source of candidate batches (the AI search integration).
/// The engine never performs network I/O itself; it only normalizes
/// whatever payload the producer hands back.
#[async_trait::async_trait]
pub trait CandidateProducer: Send + Sync {
    /// Fetch one raw batch for `spec`. The payload is expected to be a JSON
    /// array of candidate objects; parsing and repair happen in `ingest`.
    async fn search(&self, spec: &SearchSpec) -> Result<String>;
    fn name(&self) -> &'static str;
}
