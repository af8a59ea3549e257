use url::Url;

use crate::dom::PageDocument;

const DEFAULT_MAX_LINKS: usize = 5_000;

/// Collects crawlable links from a page: absolute http(s) URLs without
/// fragments, deduplicated, in document order.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    max_links: usize,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self::with_max_links(DEFAULT_MAX_LINKS)
    }

    pub fn with_max_links(max_links: usize) -> Self {
        Self { max_links }
    }

    pub fn extract(&self, doc: &PageDocument, page_url: &Url) -> Vec<Url> {
        let mut links: Vec<Url> = Vec::new();
        for anchor in doc.elements_by_tag("a") {
            if links.len() >= self.max_links {
                break;
            }
            let Some(href) = doc.attr(anchor, "href") else {
                continue;
            };
            let Some(url) = resolve_link(href, page_url) else {
                continue;
            };
            if !links.contains(&url) {
                links.push(url);
            }
        }
        links
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut url = page_url.join(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_http_links_without_fragments() {
        let doc = PageDocument::parse(
            r##"<a href="/a#x">A</a><a href="b">B</a><a href="mailto:x@y.z">M</a>
                <a href="javascript:void(0)">J</a><a href="/a">again</a><a href="#top">T</a>"##,
        );
        let page = Url::parse("https://example.com/docs/page").unwrap();
        let links: Vec<String> = LinkExtractor::new()
            .extract(&doc, &page)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/a",
                "https://example.com/docs/b",
                "https://example.com/docs/page",
            ]
        );
    }

    #[test]
    fn respects_the_cap() {
        let doc = PageDocument::parse(r#"<a href="/1">1</a><a href="/2">2</a><a href="/3">3</a>"#);
        let page = Url::parse("https://example.com/").unwrap();
        assert_eq!(LinkExtractor::with_max_links(2).extract(&doc, &page).len(), 2);
    }
}
