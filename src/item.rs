// src/item.rs
use serde::{Deserialize, Serialize};

/// A normalized news record.
///
/// Field names serialize in camelCase so the persisted favorites payload
/// stays compatible with what the dashboard frontend historically wrote
/// (`imageUrl`, `isTopStory`, `savedAt`).
///
/// `saved_at` is kept as an RFC-3339 string rather than a parsed timestamp:
/// a single malformed legacy value must drop only that item at load time,
/// never fail deserialization of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Process-unique identifier, assigned by the normalizer. Never empty.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub time: String,
    /// Classification labels; insertion order preserved, duplicates allowed.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_top_story: bool,
    /// Canonical external link. Always set on freshly normalized items (the
    /// normalizer synthesizes a search link when the producer can't supply
    /// one); may be absent on legacy persisted records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// RFC-3339 timestamp, present iff the item resides in the favorites
    /// store. Set at the moment of favoriting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_wire_names() {
        let item = NewsItem {
            id: "gen-1-0".into(),
            title: "t".into(),
            summary: "s".into(),
            image_url: "img".into(),
            source: "Reuters".into(),
            time: "2 hours ago".into(),
            tags: vec!["Policy".into()],
            is_top_story: true,
            url: Some("https://example.test/a".into()),
            saved_at: None,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"imageUrl\""));
        assert!(json.contains("\"isTopStory\""));
        assert!(!json.contains("\"savedAt\""));

        let back: NewsItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let back: NewsItem = serde_json::from_str(r#"{"id":"x","title":"t"}"#).unwrap();
        assert_eq!(back.id, "x");
        assert!(back.summary.is_empty());
        assert!(back.tags.is_empty());
        assert!(!back.is_top_story);
        assert!(back.url.is_none());
        assert!(back.saved_at.is_none());
    }
}
