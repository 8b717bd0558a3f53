use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A link found on a rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLink {
    /// Absolute URL the anchor points to
    pub href: String,

    /// Trimmed, non-empty anchor text
    pub title: String,
}

impl ExtractedLink {
    pub fn new(href: String, title: String) -> Self {
        Self { href, title }
    }
}

/// Markup captured after scroll convergence
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub html: String,
}

/// A stored link, owned by the caller who extracted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedLinkRecord {
    /// Owner identity, used to scope reads
    pub user_id: String,

    /// Page the link was extracted from
    pub source_url: String,

    pub href: String,

    pub title: String,

    pub created_at: DateTime<Utc>,
}

impl PersistedLinkRecord {
    pub fn from_link(
        owner: &str,
        source_url: &str,
        link: &ExtractedLink,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: owner.to_string(),
            source_url: source_url.to_string(),
            href: link.href.clone(),
            title: link.title.clone(),
            created_at,
        }
    }
}

/// Body of a scrape request
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: String,
}

/// Body of a successful scrape response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub data: Vec<ExtractedLink>,
}

/// Body of a history response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub data: Vec<PersistedLinkRecord>,
}

/// Body of any failed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_column_names() {
        let link = ExtractedLink::new("https://example.com/about".into(), "About".into());
        let created_at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = PersistedLinkRecord::from_link("user-1", "https://example.com", &link, created_at);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["user_id"], "user-1");
        assert_eq!(value["source_url"], "https://example.com");
        assert_eq!(value["href"], "https://example.com/about");
        assert_eq!(value["title"], "About");
        assert_eq!(value["created_at"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn test_scrape_request_missing_url_defaults_empty() {
        let request: ScrapeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.url.is_empty());
    }
}
