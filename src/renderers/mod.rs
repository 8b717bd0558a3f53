pub mod scroll;
pub mod webdriver;

use crate::error::ExtractionError;
use crate::results::RenderResult;
use async_trait::async_trait;
use url::Url;

pub use webdriver::WebDriverRenderer;

/// Produces fully rendered markup for a page
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate, let lazy content load by scrolling, and capture the final markup
    async fn render(&self, url: &Url) -> Result<RenderResult, ExtractionError>;
}
