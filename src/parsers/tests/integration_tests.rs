use crate::error::ExtractionError;
use crate::parsers::html;
use url::Url;

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    #[test]
    fn test_about_and_fragment() {
        let markup = r##"<a href="/about">About</a><a href="#top">Top</a>"##;
        let links = html::extract_links(markup, &base()).unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "https://example.com/about");
        assert_eq!(links[0].title, "About");
    }

    #[test]
    fn test_document_order_and_duplicates_preserved() {
        let markup = r#"
            <html><body>
              <nav><a href="/b">B</a></nav>
              <main>
                <a href="/a">A</a>
                <p><a href="/b">B again</a></p>
              </main>
            </body></html>"#;
        let links = html::extract_links(markup, &base()).unwrap();

        let hrefs: Vec<_> = links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "https://example.com/b",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
    }

    #[test]
    fn test_filtered_anchors_are_skipped() {
        let markup = r##"
            <a>No href</a>
            <a href="">Empty href</a>
            <a href="#section">Jump</a>
            <a href="javascript:void(0)">Script</a>
            <a href="/blank">   </a>
            <a href="/img"><img src="x.png"></a>
            <a href="/kept">  Kept  </a>"##;
        let result = html::parse(markup, &base()).unwrap();

        assert_eq!(result.anchors_seen, 7);
        assert_eq!(result.skipped, 6);
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].title, "Kept");
    }

    #[test]
    fn test_nested_text_is_collected() {
        let markup = r#"<a href="docs/intro"><span>Getting</span> <b>started</b></a>"#;
        let base = Url::parse("https://example.com/guide/").unwrap();
        let links = html::extract_links(markup, &base).unwrap();

        assert_eq!(links[0].href, "https://example.com/guide/docs/intro");
        assert_eq!(links[0].title, "Getting started");
    }

    #[test]
    fn test_protocol_relative_and_absolute() {
        let markup = r#"
            <a href="//cdn.example.net/file">CDN</a>
            <a href="http://other.org/x?y=1">Other</a>"#;
        let base = Url::parse("https://example.com/page").unwrap();
        let links = html::extract_links(markup, &base).unwrap();

        assert_eq!(links[0].href, "https://cdn.example.net/file");
        assert_eq!(links[1].href, "http://other.org/x?y=1");
    }

    #[test]
    fn test_emitted_links_hold_invariants() {
        let markup = r##"
            <a href="../up">Up</a>
            <a href="?page=2">Next</a>
            <a href="#x">X</a>
            <a href="javascript:alert(1)">Alert</a>
            <a href="mailto:team@example.com">Mail</a>
            <a href="/path#frag">Frag</a>
            <a href="JavaScript:alert(1)">Mixed</a>
            <a href=" javascript:alert(2)">Padded</a>
            <a href="java&#9;script:alert(3)">Tabbed</a>
            <a href=" #top">Top</a>"##;
        let base = Url::parse("https://example.com/a/b/c").unwrap();
        let other = Url::parse("https://elsewhere.io/z/").unwrap();
        let links = html::extract_links(markup, &base).unwrap();

        let titles: Vec<&str> = links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["Up", "Next", "Mail", "Frag"]);
        for link in &links {
            assert!(!link.href.starts_with('#'));
            assert!(!link.href.to_ascii_lowercase().starts_with("javascript:"));
            assert!(!link.title.trim().is_empty());
            let again = other.join(&link.href).unwrap();
            assert_eq!(again.as_str(), link.href);
        }
    }

    #[test]
    fn test_no_anchors_is_empty_not_error() {
        let links = html::extract_links("<html><body><p>Nothing</p></body></html>", &base()).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_empty_markup_is_parse_error() {
        assert!(matches!(
            html::extract_links("   \n", &base()),
            Err(ExtractionError::Parse(_))
        ));
    }
}
