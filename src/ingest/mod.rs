// src/ingest/mod.rs
pub mod types;

use anyhow::{anyhow, Result};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::ingest::types::RawCandidate;
use crate::item::NewsItem;

/// Sentinel shown when the producer did not name a source.
pub const UNKNOWN_SOURCE: &str = "Unknown";
/// Sentinel shown when the producer did not supply a publish time.
pub const UNKNOWN_TIME: &str = "—";

/// Below this length a URL cannot plausibly be a real article link.
const MIN_URL_LEN: usize = 10;

/// One-time metrics registration (so series show up on /metrics of the host app).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_candidates_total",
            "Candidates parsed from producer batches."
        );
        describe_counter!(
            "ingest_normalized_total",
            "Candidates kept after normalization."
        );
        describe_counter!(
            "ingest_dropped_total",
            "Candidates dropped for carrying no display value."
        );
        describe_counter!(
            "ingest_batch_failures_total",
            "Producer payloads rejected as unparseable."
        );
    });
}

/// Clean a display text field: decode HTML entities, strip tags, collapse
/// whitespace, trim.
pub fn clean_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 4) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// The producer is an LLM and may wrap its JSON in markdown code fences
/// despite instructions not to.
fn strip_code_fences(raw: &str) -> String {
    static RE_FENCE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_FENCE.get_or_init(|| regex::Regex::new(r"```json\n?|```").unwrap());
    re.replace_all(raw, "").trim().to_string()
}

/// Parse one raw producer payload into candidates.
///
/// Unparseable text or a non-array payload is a batch-level failure: the
/// whole ingestion attempt fails and nothing gets normalized. Defects inside
/// individual candidates never fail the batch; wrongly typed fields degrade
/// to absent and are repaired downstream.
pub fn parse_batch(raw: &str) -> Result<Vec<RawCandidate>> {
    ensure_metrics_described();

    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        counter!("ingest_batch_failures_total").increment(1);
        anyhow!("failed to parse news data from producer response: {e}")
    })?;
    let arr = value.as_array().ok_or_else(|| {
        counter!("ingest_batch_failures_total").increment(1);
        anyhow!("producer response is not a JSON array of candidates")
    })?;

    let candidates = arr.iter().map(candidate_from_value).collect::<Vec<_>>();
    counter!("ingest_candidates_total").increment(candidates.len() as u64);
    Ok(candidates)
}

/// Lenient per-candidate extraction: a wrongly typed field is treated as
/// absent, never as an error.
fn candidate_from_value(v: &Value) -> RawCandidate {
    let get_str = |key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);

    let tags = v
        .get("tags")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    RawCandidate {
        title: get_str("title").unwrap_or_default(),
        summary: get_str("summary").unwrap_or_default(),
        source: get_str("source"),
        time: get_str("time"),
        tags,
        is_top_story: v.get("isTopStory").and_then(Value::as_bool).unwrap_or(false),
        url: get_str("url"),
        image_url: get_str("imageUrl"),
    }
}

/// Normalize a parsed batch into `NewsItem`s.
///
/// Candidates with neither title nor summary are dropped silently (they
/// carry no display value). `index` is the candidate's 0-based position in
/// the raw batch, so assigned ids and placeholder images stay unique within
/// a batch even when the producer repeats itself.
pub fn normalize_batch(candidates: Vec<RawCandidate>, config: &EngineConfig) -> Vec<NewsItem> {
    ensure_metrics_described();

    let batch_ts = chrono::Utc::now().timestamp_millis();
    let mut items = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;

    for (index, cand) in candidates.into_iter().enumerate() {
        match normalize_candidate(cand, batch_ts, index, config) {
            Some(item) => items.push(item),
            None => dropped += 1,
        }
    }

    counter!("ingest_normalized_total").increment(items.len() as u64);
    counter!("ingest_dropped_total").increment(dropped as u64);
    if dropped > 0 {
        tracing::debug!(dropped, "dropped candidates without display value");
    }
    items
}

fn normalize_candidate(
    cand: RawCandidate,
    batch_ts: i64,
    index: usize,
    config: &EngineConfig,
) -> Option<NewsItem> {
    let title = clean_text(&cand.title);
    let summary = clean_text(&cand.summary);
    if title.is_empty() && summary.is_empty() {
        return None;
    }

    let source = cand
        .source
        .as_deref()
        .map(clean_text)
        .filter(|s| !s.is_empty());

    let url = match cand.url.as_deref().filter(|u| url_is_acceptable(u)) {
        Some(u) => u.to_string(),
        None => fallback_search_url(&config.search_base, &title, source.as_deref()),
    };

    let image_url = match cand.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(u) => u.to_string(),
        None => format!("{}{}", config.image_base, index),
    };

    Some(NewsItem {
        id: format!("gen-{batch_ts}-{index}"),
        title,
        summary,
        image_url,
        source: source.unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        time: cand
            .time
            .as_deref()
            .map(clean_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TIME.to_string()),
        tags: cand.tags,
        is_top_story: cand.is_top_story,
        url: Some(url),
        saved_at: None,
    })
}

/// A candidate URL is usable only if it is a syntactically valid absolute
/// http(s) URL of plausible length. Anything else gets replaced.
fn url_is_acceptable(u: &str) -> bool {
    if u.len() < MIN_URL_LEN {
        return false;
    }
    match url::Url::parse(u) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Characters escaped when building the fallback query: everything except
/// alphanumerics and `-_.!~*'()`, i.e. what `encodeURIComponent` escapes.
const QUERY_ESCAPE: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Synthesized fallback: a web search for "{title} {source}", so every
/// rendered item has a clickable, non-broken destination even when the
/// producer could not supply a real link.
fn fallback_search_url(search_base: &str, title: &str, source: Option<&str>) -> String {
    let query = match source {
        Some(s) => format!("{title} {s}"),
        None => title.to_string(),
    };
    let encoded = percent_encoding::utf8_percent_encode(query.trim(), QUERY_ESCAPE);
    format!("{search_base}{encoded}")
}
