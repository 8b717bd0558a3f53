use crate::error::ExtractionError;
use url::Url;

/// Decide whether an anchor becomes an extracted link.
///
/// `title` must already be trimmed. Anchors failing any rule are dropped
/// silently; most of them are navigation chrome.
pub fn is_qualifying_anchor(href: Option<&str>, title: &str) -> bool {
    let Some(href) = href else {
        return false;
    };
    // URL parsing drops leading and trailing spaces and control characters
    let href = href.trim_matches(|c: char| c <= ' ');

    if href.is_empty() {
        return false;
    }

    // In-page jumps
    if href.starts_with('#') {
        return false;
    }

    if is_script_reference(href) {
        return false;
    }

    !title.is_empty()
}

/// Schemes are case-insensitive, so `JavaScript:` counts too
fn is_script_reference(href: &str) -> bool {
    href.get(..SCRIPT_SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCRIPT_SCHEME))
}

const SCRIPT_SCHEME: &str = "javascript:";

/// Whether a resolved link can be followed at all.
///
/// The URL parser removes tabs and newlines anywhere in the input, so
/// `java\tscript:` only shows its scheme after resolving.
pub fn is_followable(resolved: &Url) -> bool {
    resolved.scheme() != "javascript"
}

/// Resolve an href against the page URL.
///
/// Handles relative, protocol-relative and absolute references. Returns
/// `None` when the reference cannot be resolved at all.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    match base.join(href) {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            ::log::debug!("Skipping unresolvable href {:?}: {}", href, e);
            None
        }
    }
}

/// Validate the requested source URL before any remote call is made
pub fn validate_source_url(raw: &str) -> Result<Url, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::Validation("URL is required".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| ExtractionError::Validation(format!("malformed URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractionError::Validation(format!(
            "unsupported URL scheme: {}",
            url.scheme()
        )));
    }

    if url.host().is_none() {
        return Err(ExtractionError::Validation("URL has no host".to_string()));
    }

    Ok(url)
}
