pub mod html;

#[cfg(test)]
mod tests;

use crate::results::ExtractedLink;

/// Result of walking the anchors of a document
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Qualifying links in document order
    pub links: Vec<ExtractedLink>,
    /// Number of anchor elements seen
    pub anchors_seen: usize,
    /// Anchors dropped by the inclusion filter
    pub skipped: usize,
}

impl ParseResult {
    /// Consumes the result, keeping only the links
    pub fn into_links(self) -> Vec<ExtractedLink> {
        self.links
    }
}
