use crate::error::ExtractionError;
use crate::filter;
use crate::parsers::ParseResult;
use crate::results::ExtractedLink;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Parses rendered HTML and returns the qualifying links in document order.
///
/// Links are not deduplicated. Fails only when there is no markup to build a
/// tree from; anchors that fail the filter are skipped.
pub fn extract_links(html: &str, base: &Url) -> Result<Vec<ExtractedLink>, ExtractionError> {
    parse(html, base).map(ParseResult::into_links)
}

/// Same as [`extract_links`] but keeps the anchor statistics
pub fn parse(html: &str, base: &Url) -> Result<ParseResult, ExtractionError> {
    if html.trim().is_empty() {
        return Err(ExtractionError::Parse("rendered markup is empty".to_string()));
    }

    let doc = Html::parse_document(html);
    let link_selector = Selector::parse("a")
        .map_err(|e| ExtractionError::Parse(format!("invalid anchor selector: {e}")))?;

    let mut result = ParseResult::default();
    for element in doc.select(&link_selector) {
        result.anchors_seen += 1;
        match link_from_anchor(&element, base) {
            Some(link) => result.links.push(link),
            None => result.skipped += 1,
        }
    }

    // Log the number of links found
    ::log::debug!(
        "HTML parser kept {} of {} anchors ({} skipped)",
        result.links.len(),
        result.anchors_seen,
        result.skipped
    );
    if !result.links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            result.links.iter().take(5).map(|l| &l.href).collect::<Vec<_>>()
        );
    }

    Ok(result)
}

/// Turns one anchor element into a link if it passes the filter
fn link_from_anchor(element: &ElementRef<'_>, base: &Url) -> Option<ExtractedLink> {
    let href = element.value().attr("href");
    let text = element.text().collect::<String>();
    let title = text.trim();

    if !filter::is_qualifying_anchor(href, title) {
        return None;
    }

    let resolved = filter::resolve_href(base, href?)?;
    if !filter::is_followable(&resolved) {
        return None;
    }
    Some(ExtractedLink::new(resolved.to_string(), title.to_string()))
}
