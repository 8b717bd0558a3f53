use crate::error::{ExtractionError, Stage};
use crate::filter;
use crate::identity::{CallerId, IdentityVerifier};
use crate::parsers::html;
use crate::renderers::Renderer;
use crate::results::{ExtractedLink, PersistedLinkRecord};
use crate::store::{self, LinkStore};
use chrono::Utc;
use std::sync::Arc;

/// One request to extract links from a page
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub source_url: String,
    /// Bearer credential, if the caller sent one
    pub credential: Option<String>,
}

impl ExtractionRequest {
    pub fn new(source_url: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            source_url: source_url.into(),
            credential,
        }
    }
}

/// Result of a successful extraction cycle
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub owner: CallerId,
    pub links: Vec<ExtractedLink>,
    /// Records written to the store
    pub persisted: usize,
}

/// Runs authenticate, render, extract and persist for one request.
///
/// Stages run strictly in order and the first failure ends the cycle. Nothing
/// is retried; a store failure discards the extracted links.
#[derive(Clone)]
pub struct Extractor {
    identity: Arc<dyn IdentityVerifier>,
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn LinkStore>,
}

impl Extractor {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        renderer: Arc<dyn Renderer>,
        store: Arc<dyn LinkStore>,
    ) -> Self {
        Self {
            identity,
            renderer,
            store,
        }
    }

    pub async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let started = std::time::Instant::now();
        let result = self.run(&request).await;

        match &result {
            Ok(outcome) => ::log::info!(
                "Extracted {} links from {} for {} in {:.2} seconds",
                outcome.links.len(),
                request.source_url,
                outcome.owner,
                started.elapsed().as_secs_f64()
            ),
            Err(e) => ::log::warn!(
                "Extraction of {} failed while {}: {}",
                request.source_url,
                e.stage(),
                e
            ),
        }

        result
    }

    async fn run(&self, request: &ExtractionRequest) -> Result<ExtractionOutcome, ExtractionError> {
        enter(Stage::Validating, &request.source_url);
        let source_url = filter::validate_source_url(&request.source_url)?;

        enter(Stage::Authenticating, source_url.as_str());
        let owner = self.identity.verify(request.credential.as_deref()).await?;

        enter(Stage::Rendering, source_url.as_str());
        let rendered = self.renderer.render(&source_url).await?;

        enter(Stage::Extracting, source_url.as_str());
        let links = html::extract_links(&rendered.html, &source_url)?;

        enter(Stage::Persisting, source_url.as_str());
        let persisted = store::persist_links(
            self.store.as_ref(),
            owner.as_str(),
            source_url.as_str(),
            &links,
            Utc::now(),
        )
        .await?;

        Ok(ExtractionOutcome {
            owner,
            links,
            persisted,
        })
    }

    /// Newest stored links of the authenticated caller
    pub async fn history(
        &self,
        credential: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PersistedLinkRecord>, ExtractionError> {
        let owner = self.identity.verify(credential).await?;
        self.store.query(owner.as_str(), limit).await
    }
}

fn enter(stage: Stage, url: &str) {
    ::log::debug!("Stage {} for {}", stage, url);
}
