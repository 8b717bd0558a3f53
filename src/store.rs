use crate::config::StoreConfig;
use crate::error::ExtractionError;
use crate::results::{ExtractedLink, PersistedLinkRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::Mutex;

/// Durable home for extracted links
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Write all records in one batch, returning how many were written
    async fn bulk_insert(&self, records: &[PersistedLinkRecord]) -> Result<usize, ExtractionError>;

    /// Newest records owned by `owner`, at most `limit` of them
    async fn query(
        &self,
        owner: &str,
        limit: usize,
    ) -> Result<Vec<PersistedLinkRecord>, ExtractionError>;
}

/// Persist extracted links for `owner` with one bulk write.
///
/// An empty link list writes nothing and succeeds. All records share the
/// same `created_at`.
pub async fn persist_links<S>(
    store: &S,
    owner: &str,
    source_url: &str,
    links: &[ExtractedLink],
    now: DateTime<Utc>,
) -> Result<usize, ExtractionError>
where
    S: LinkStore + ?Sized,
{
    if links.is_empty() {
        ::log::debug!("No links to store for {}", source_url);
        return Ok(0);
    }

    let records: Vec<PersistedLinkRecord> = links
        .iter()
        .map(|link| PersistedLinkRecord::from_link(owner, source_url, link, now))
        .collect();

    store.bulk_insert(&records).await
}

/// Link store backed by a PostgREST-style HTTP API
#[derive(Debug, Clone)]
pub struct RestLinkStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestLinkStore {
    pub fn new(config: &StoreConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                config.base_url.trim_end_matches('/'),
                config.table
            ),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
    }
}

/// Turns a failed store response into a store error, logging the body
async fn store_failure(action: &str, response: reqwest::Response) -> ExtractionError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ::log::error!(
        "Store {} failed with HTTP {}: {}",
        action,
        status,
        crate::utils::truncate_for_log(&body, 500)
    );
    ExtractionError::Store(format!("{action} returned HTTP {}", status.as_u16()))
}

#[async_trait]
impl LinkStore for RestLinkStore {
    async fn bulk_insert(&self, records: &[PersistedLinkRecord]) -> Result<usize, ExtractionError> {
        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=minimal")
            .json(records)
            .send()
            .await
            .map_err(|e| {
                ::log::error!("Store insert request failed: {}", e);
                ExtractionError::Store(format!("insert request failed: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(store_failure("insert", response).await);
        }

        ::log::info!("Stored {} links", records.len());
        Ok(records.len())
    }

    async fn query(
        &self,
        owner: &str,
        limit: usize,
    ) -> Result<Vec<PersistedLinkRecord>, ExtractionError> {
        let owner_filter = format!("eq.{owner}");
        let limit = limit.to_string();
        let response = self
            .request(reqwest::Method::GET)
            .query(&[
                ("select", "*"),
                ("user_id", owner_filter.as_str()),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                ::log::error!("Store query request failed: {}", e);
                ExtractionError::Store(format!("query request failed: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(store_failure("query", response).await);
        }

        response
            .json::<Vec<PersistedLinkRecord>>()
            .await
            .map_err(|e| ExtractionError::Store(format!("unreadable query response: {e}")))
    }
}

/// In-process link store
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    records: Mutex<Vec<PersistedLinkRecord>>,
    insert_calls: Mutex<usize>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bulk writes received so far
    pub async fn insert_calls(&self) -> usize {
        *self.insert_calls.lock().await
    }

    /// Every stored record, oldest first
    pub async fn records(&self) -> Vec<PersistedLinkRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn bulk_insert(&self, records: &[PersistedLinkRecord]) -> Result<usize, ExtractionError> {
        *self.insert_calls.lock().await += 1;
        let mut stored = self.records.lock().await;
        stored.extend_from_slice(records);
        Ok(records.len())
    }

    async fn query(
        &self,
        owner: &str,
        limit: usize,
    ) -> Result<Vec<PersistedLinkRecord>, ExtractionError> {
        let stored = self.records.lock().await;
        let mut owned: Vec<PersistedLinkRecord> = stored
            .iter()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect();
        // Stable sort keeps insertion order inside one batch
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(limit);
        Ok(owned)
    }
}
