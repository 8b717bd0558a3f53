use crate::config::RenderConfig;
use crate::error::{ExtractionError, RenderError};
use crate::renderers::Renderer;
use crate::renderers::scroll::{self, ScrollSurface};
use crate::results::RenderResult;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::{Capabilities, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use url::Url;

const READY_STATE_SCRIPT: &str = "return document.readyState;";

const NAVIGATION_STATUS_SCRIPT: &str = r#"
const entries = performance.getEntriesByType('navigation');
if (entries.length > 0 && typeof entries[0].responseStatus === 'number') {
  return entries[0].responseStatus;
}
return null;
"#;

const DOCUMENT_HEIGHT_SCRIPT: &str = r#"
const body = document.body ? document.body.scrollHeight : 0;
const root = document.documentElement ? document.documentElement.scrollHeight : 0;
return Math.max(body, root);
"#;

const SCROLL_TO_BOTTOM_SCRIPT: &str = r#"
const root = document.scrollingElement || document.documentElement || document.body;
window.scrollTo(0, root ? root.scrollHeight : 0);
"#;

/// How often `document.readyState` is polled after navigation
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Renders pages through a WebDriver server (chromedriver, geckodriver, Selenium).
///
/// Each render opens its own session and closes it afterwards, so concurrent
/// requests never share browser state.
#[derive(Debug, Clone)]
pub struct WebDriverRenderer {
    config: RenderConfig,
}

impl WebDriverRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Connects to the WebDriver instance
    async fn connect(&self) -> Result<Client, ExtractionError> {
        let mut builder = ClientBuilder::native();
        if self.config.headless {
            builder.capabilities(headless_capabilities());
        }

        let connect = builder.connect(&self.config.webdriver_url);
        match timeout(self.config.command_timeout(), connect).await {
            Ok(Ok(client)) => {
                ::log::debug!("Connected to WebDriver at {}", self.config.webdriver_url);
                Ok(client)
            }
            Ok(Err(e)) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.config.webdriver_url,
                    e
                );
                ::log::error!(
                    "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
                );
                Err(RenderError::Session {
                    message: e.to_string(),
                }
                .into())
            }
            Err(_) => Err(RenderError::Timeout {
                after_secs: self.config.command_timeout_secs,
            }
            .into()),
        }
    }

    /// Runs navigate, wait, scroll and capture on an open session
    async fn render_with(&self, client: &Client, url: &Url) -> Result<RenderResult, ExtractionError> {
        let started = Instant::now();
        let nav_timeout = self.config.navigation_timeout();
        let deadline = Instant::now() + nav_timeout;

        bounded(
            self.config.command_timeout(),
            "setting timeouts for",
            url,
            client.update_timeouts(TimeoutConfiguration::new(
                Some(self.config.command_timeout()),
                Some(nav_timeout),
                None,
            )),
        )
        .await?;

        // Navigate to the URL
        bounded(nav_timeout, "accessing", url, client.goto(url.as_str())).await?;
        wait_until_ready(client, url, deadline, self.config.navigation_timeout_secs).await?;
        check_navigation_status(client, url, self.config.command_timeout()).await?;

        let mut surface = PageSurface {
            client,
            url,
            command_timeout: self.config.command_timeout(),
        };
        let outcome = scroll::converge(&mut surface, &self.config.scroll_policy()).await?;

        // Get the page source
        let html = bounded(
            self.config.command_timeout(),
            "getting source for",
            url,
            client.source(),
        )
        .await?;

        ::log::debug!(
            "Rendered {} in {:.2} seconds ({} scrolls, {} bytes)",
            url,
            started.elapsed().as_secs_f64(),
            outcome.scrolls,
            html.len()
        );

        Ok(RenderResult { html })
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn render(&self, url: &Url) -> Result<RenderResult, ExtractionError> {
        ::log::debug!("RENDER: {}", url);
        let client = self.connect().await?;

        let result = self.render_with(&client, url).await;

        // Close the session whatever happened
        match timeout(self.config.command_timeout(), client.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => ::log::warn!("Failed to close WebDriver session: {}", e),
            Err(_) => ::log::warn!(
                "Timed out closing WebDriver session after {}s",
                self.config.command_timeout_secs
            ),
        }

        result
    }
}

/// A live browser page seen through WebDriver scripts
struct PageSurface<'a> {
    client: &'a Client,
    url: &'a Url,
    command_timeout: Duration,
}

#[async_trait]
impl<'a> ScrollSurface for PageSurface<'a> {
    async fn document_height(&mut self) -> Result<u64, ExtractionError> {
        let value = bounded(
            self.command_timeout,
            "measuring",
            self.url,
            self.client.execute(DOCUMENT_HEIGHT_SCRIPT, vec![]),
        )
        .await?;
        Ok(height_from_value(&value))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ExtractionError> {
        bounded(
            self.command_timeout,
            "scrolling",
            self.url,
            self.client.execute(SCROLL_TO_BOTTOM_SCRIPT, vec![]),
        )
        .await?;
        Ok(())
    }
}

/// Polls `document.readyState` until the page reports complete
async fn wait_until_ready(
    client: &Client,
    url: &Url,
    deadline: Instant,
    navigation_timeout_secs: u64,
) -> Result<(), ExtractionError> {
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            ::log::error!("Timeout waiting for {} to finish loading", url);
            return Err(RenderError::Timeout {
                after_secs: navigation_timeout_secs,
            }
            .into());
        }

        let state = bounded(
            remaining,
            "checking ready state of",
            url,
            client.execute(READY_STATE_SCRIPT, vec![]),
        )
        .await?;
        if state.as_str() == Some("complete") {
            return Ok(());
        }

        tokio::time::sleep(READY_POLL_INTERVAL.min(remaining)).await;
    }
}

/// Fails when the browser saw a non-success HTTP status for the page itself
async fn check_navigation_status(
    client: &Client,
    url: &Url,
    command_timeout: Duration,
) -> Result<(), ExtractionError> {
    let value = bounded(
        command_timeout,
        "reading status of",
        url,
        client.execute(NAVIGATION_STATUS_SCRIPT, vec![]),
    )
    .await?;

    match navigation_status(&value) {
        Some(status) if status >= 400 => {
            ::log::error!("Target page {} returned HTTP {}", url, status);
            Err(RenderError::Status {
                status,
                message: format!("target page {url} returned HTTP {status}"),
            }
            .into())
        }
        Some(status) => {
            ::log::trace!("Target page {} returned HTTP {}", url, status);
            Ok(())
        }
        None => {
            ::log::debug!("Browser did not report a status for {}", url);
            Ok(())
        }
    }
}

/// Runs a WebDriver command with an upper bound, mapping failures to render errors
async fn bounded<T, F>(
    limit: Duration,
    context: &str,
    url: &Url,
    command: F,
) -> Result<T, ExtractionError>
where
    F: Future<Output = Result<T, CmdError>>,
{
    let after_secs = limit.as_secs().max(1);
    match timeout(limit, command).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(handle_navigation_error(e, context, url, after_secs)),
        Err(_) => {
            ::log::error!("Timeout while {} {}", context, url);
            Err(RenderError::Timeout { after_secs }.into())
        }
    }
}

/// Handles errors that occur during navigation or page source retrieval.
///
/// The driver enforces the page-load timeout itself and usually reports it
/// before the local bound fires; both count as a render timeout.
fn handle_navigation_error(
    error: CmdError,
    context: &str,
    url: &Url,
    after_secs: u64,
) -> ExtractionError {
    if error.is_timeout() || error.is_script_timeout() || matches!(error, CmdError::WaitTimeout) {
        ::log::error!("WebDriver timed out while {} {}: {}", context, url, error);
        return RenderError::Timeout { after_secs }.into();
    }

    let message = error.to_string();
    if error.is_invalid_session_id()
        || message.contains("Unable to find session")
        || message.contains("invalid session id")
    {
        ::log::warn!("Lost session while {} {}", context, url);
        RenderError::Session { message }.into()
    } else {
        ::log::error!("Failed while {} {}: {}", context, url, message);
        RenderError::Navigation { message }.into()
    }
}

fn headless_capabilities() -> Capabilities {
    let caps = json!({
        "goog:chromeOptions": {
            "args": ["--headless=new", "--disable-gpu", "--no-sandbox", "--window-size=1366,900"]
        },
        "moz:firefoxOptions": {
            "args": ["-headless"]
        }
    });
    match caps {
        Value::Object(map) => map,
        _ => Capabilities::new(),
    }
}

/// Heights come back as integers or floats depending on the browser
fn height_from_value(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|h| h.max(0.0) as u64))
        .unwrap_or(0)
}

/// A zero status means the browser could not tell (e.g. cached or cross-origin)
fn navigation_status(value: &Value) -> Option<u16> {
    value
        .as_u64()
        .and_then(|s| u16::try_from(s).ok())
        .filter(|s| *s != 0)
}
