use url2md_core::UNTITLED;

use crate::dom::PageDocument;

/// Separators between an article title and a trailing site name.
const SITE_SEPARATORS: &[&str] = &[" | ", " – ", " — ", " · "];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTitle {
    /// Title with any trailing site-name segment removed.
    pub title: String,
    /// Title exactly as found in the page.
    pub original: String,
}

/// `<title>`, then `og:title`, then the first `<h1>`, then `untitled`.
///
/// Must run before normalization, which drops `<head>`-adjacent chrome.
pub fn extract_title(doc: &PageDocument) -> PageTitle {
    let original = title_element(doc)
        .or_else(|| og_title(doc))
        .or_else(|| first_h1(doc))
        .unwrap_or_else(|| UNTITLED.to_string());
    PageTitle {
        title: strip_site_suffix(&original).to_string(),
        original,
    }
}

pub fn strip_site_suffix(title: &str) -> &str {
    SITE_SEPARATORS
        .iter()
        .filter_map(|sep| title.rfind(sep))
        .max()
        .map(|pos| title[..pos].trim())
        .filter(|head| !head.is_empty())
        .unwrap_or(title)
}

fn title_element(doc: &PageDocument) -> Option<String> {
    let id = doc.first_element_by_tag("title")?;
    non_empty(doc.text_content(id))
}

fn og_title(doc: &PageDocument) -> Option<String> {
    doc.elements_by_tag("meta")
        .into_iter()
        .find(|id| doc.attr(*id, "property") == Some("og:title"))
        .and_then(|id| doc.attr(id, "content"))
        .and_then(|content| non_empty(content.to_string()))
}

fn first_h1(doc: &PageDocument) -> Option<String> {
    let id = doc.first_element_by_tag("h1")?;
    non_empty(doc.text_content(id))
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_of(html: &str) -> PageTitle {
        extract_title(&PageDocument::parse(html))
    }

    #[test]
    fn prefers_title_element() {
        let t = title_of("<html><head><title> Install Guide | Acme Docs </title></head><body><h1>Other</h1></body></html>");
        assert_eq!(t.original, "Install Guide | Acme Docs");
        assert_eq!(t.title, "Install Guide");
    }

    #[test]
    fn falls_back_to_og_title_then_h1() {
        let og = title_of(r#"<head><meta property="og:title" content="From OG"></head><h1>H</h1>"#);
        assert_eq!(og.original, "From OG");
        let h1 = title_of("<body><h1>First <em>heading</em></h1><h1>Second</h1></body>");
        assert_eq!(h1.original, "First heading");
    }

    #[test]
    fn untitled_when_nothing_found() {
        assert_eq!(title_of("<p>text</p>").title, "untitled");
    }

    #[test]
    fn strips_only_the_last_site_segment() {
        assert_eq!(strip_site_suffix("A | B | Site"), "A | B");
        assert_eq!(strip_site_suffix("Guide — Site"), "Guide");
        assert_eq!(strip_site_suffix("No separator"), "No separator");
        assert_eq!(strip_site_suffix(" | Site"), " | Site");
    }
}
