//! Strips page chrome from a [`PageDocument`] before rendering.

use std::collections::HashMap;

use ego_tree::NodeId;
use engine_logging::engine_debug;
use url::Url;

use crate::admonitions::convert_admonitions;
use crate::dom::PageDocument;

const CHROME_TAGS: &[&str] = &[
    "nav", "header", "footer", "script", "style", "iframe", "noscript", "button", "form",
];

const ASIDE_CHROME_KEYWORDS: &[&str] = &["nav", "navigation", "sidebar", "menu", "toc"];
const ASIDE_CONTENT_KEYWORDS: &[&str] = &[
    "callout", "note", "tip", "warning", "info", "caution", "admonition", "alert",
];

const TAB_GROUP_KEYWORDS: &[&str] = &["tabs", "tab-group", "tabbed"];
const TAB_PANEL_KEYWORDS: &[&str] = &["tab-panel", "tabpanel"];

/// Case-insensitive substrings of `class` or `id` that mark non-content blocks.
const CHROME_CLASS_KEYWORDS: &[&str] = &[
    "navigation",
    "navbar",
    "sidebar",
    "menu",
    "footer",
    "header",
    "breadcrumb",
    "social",
    "share",
    "cookie",
    "advertisement",
    "ad-",
    "banner",
    "popup",
    "skip",
    "category",
    "tag",
    "meta",
    "badge",
];

/// Containers that hold the whole page; keyword matches on these are ignored.
const KEYWORD_EXEMPT_TAGS: &[&str] = &["html", "body", "main", "article"];

/// Runs every normalization step in order and rewrites links against `base_url`.
pub fn normalize(doc: &mut PageDocument, base_url: &Url) {
    // Tab labels are often buttons, which the first step removes.
    let tab_labels = collect_tab_labels(doc);

    remove_chrome_tags(doc);
    remove_navigation_asides(doc);
    flatten_tabs(doc, &tab_labels);
    remove_keyword_blocks(doc);
    remove_skip_links(doc);
    convert_admonitions(doc);
    absolutize_urls(doc, base_url);
}

pub fn remove_chrome_tags(doc: &mut PageDocument) {
    let doomed: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|id| doc.tag(*id).is_some_and(|tag| CHROME_TAGS.contains(&tag)))
        .collect();
    engine_debug!("Removing {} chrome elements", doomed.len());
    for id in doomed {
        doc.remove(id);
    }
}

pub fn remove_navigation_asides(doc: &mut PageDocument) {
    for id in doc.elements_by_tag("aside") {
        let classes = doc.attr(id, "class").unwrap_or_default().to_lowercase();
        let chrome = ASIDE_CHROME_KEYWORDS.iter().any(|k| classes.contains(k));
        let content = ASIDE_CONTENT_KEYWORDS.iter().any(|k| classes.contains(k));
        if chrome && !content {
            doc.remove(id);
        }
    }
}

fn collect_tab_labels(doc: &PageDocument) -> HashMap<String, String> {
    let referenced: Vec<String> = doc
        .elements()
        .into_iter()
        .filter_map(|id| doc.attr(id, "aria-labelledby"))
        .flat_map(|ids| ids.split_whitespace().map(str::to_string))
        .collect();
    if referenced.is_empty() {
        return HashMap::new();
    }

    doc.elements()
        .into_iter()
        .filter_map(|id| {
            let element_id = doc.attr(id, "id")?;
            if !referenced.iter().any(|r| r == element_id) {
                return None;
            }
            let label = collapse_whitespace(&doc.text_content(id));
            (!label.is_empty()).then(|| (element_id.to_string(), label))
        })
        .collect()
}

/// Replaces each tab container with a plain `<div>` holding every panel, each
/// preceded by an `<h4>` with its tab label when one is known.
pub fn flatten_tabs(doc: &mut PageDocument, labels: &HashMap<String, String>) {
    for container in doc.elements() {
        if !doc.is_attached(container) || !has_class_keyword(doc, container, TAB_GROUP_KEYWORDS) {
            continue;
        }
        let panels = top_level_panels(doc, container);
        if panels.is_empty() {
            continue;
        }

        let merged = doc.create_element("div");
        for panel in &panels {
            let label = doc
                .attr(*panel, "aria-labelledby")
                .and_then(|ids| ids.split_whitespace().find_map(|id| labels.get(id)))
                .cloned();
            if let Some(label) = label {
                let heading = doc.create_element("h4");
                let text = doc.create_text(label);
                doc.append_child(heading, text);
                doc.append_child(merged, heading);
            }
            doc.append_child(merged, *panel);
        }
        engine_debug!("Flattened tab group with {} panels", panels.len());
        doc.replace_with(container, merged);
    }
}

fn top_level_panels(doc: &PageDocument, container: NodeId) -> Vec<NodeId> {
    let candidates: Vec<NodeId> = doc
        .descendant_elements(container)
        .into_iter()
        .filter(|id| {
            doc.attr(*id, "role") == Some("tabpanel")
                || has_class_keyword(doc, *id, TAB_PANEL_KEYWORDS)
        })
        .collect();

    candidates
        .iter()
        .copied()
        .filter(|id| {
            let mut parent = doc.parent(*id);
            while let Some(p) = parent {
                if p == container {
                    return true;
                }
                if candidates.contains(&p) {
                    return false;
                }
                parent = doc.parent(p);
            }
            true
        })
        .collect()
}

fn has_class_keyword(doc: &PageDocument, id: NodeId, keywords: &[&str]) -> bool {
    doc.class_list(id).iter().any(|class| {
        let class = class.to_lowercase();
        keywords.iter().any(|k| class.contains(k))
    })
}

/// Removes blocks whose class or id names navigation, ads, sharing and similar chrome.
///
/// Elements inside `<pre>` or `<code>` are left alone; syntax highlighters
/// use class names such as `tag` and `meta` for tokens.
pub fn remove_keyword_blocks(doc: &mut PageDocument) {
    for id in doc.elements() {
        if !doc.is_attached(id) {
            continue;
        }
        let Some(tag) = doc.tag(id) else { continue };
        if KEYWORD_EXEMPT_TAGS.contains(&tag)
            || tag == "pre"
            || tag == "code"
            || doc.has_ancestor_tag(id, "pre")
            || doc.has_ancestor_tag(id, "code")
        {
            continue;
        }
        let class = doc.attr(id, "class").unwrap_or_default().to_lowercase();
        let element_id = doc.attr(id, "id").unwrap_or_default().to_lowercase();
        let matched = CHROME_CLASS_KEYWORDS
            .iter()
            .any(|k| class.contains(k) || element_id.contains(k));
        if matched {
            doc.remove(id);
        }
    }
}

pub fn remove_skip_links(doc: &mut PageDocument) {
    for id in doc.elements_by_tag("a") {
        if doc.attr(id, "href").is_some_and(is_skip_link) {
            doc.remove(id);
        }
    }
}

fn is_skip_link(href: &str) -> bool {
    let href = href.to_lowercase();
    let Some(hash) = href.find('#') else {
        return false;
    };
    href[hash + 1..].contains("top") || href.contains("#content") || href.contains("#main")
}

/// Resolves `a[href]`, `img[src]` and every `img[srcset]` candidate against `base_url`.
pub fn absolutize_urls(doc: &mut PageDocument, base_url: &Url) {
    for id in doc.elements_by_tag("a") {
        if let Some(href) = doc.attr(id, "href").map(str::to_string) {
            doc.set_attr(id, "href", resolve(base_url, &href));
        }
    }
    for id in doc.elements_by_tag("img") {
        if let Some(src) = doc.attr(id, "src").map(str::to_string) {
            doc.set_attr(id, "src", resolve(base_url, &src));
        }
        if let Some(srcset) = doc.attr(id, "srcset").map(str::to_string) {
            doc.set_attr(id, "srcset", resolve_srcset(base_url, &srcset));
        }
    }
}

fn resolve(base_url: &Url, reference: &str) -> String {
    let reference = reference.trim();
    base_url
        .join(reference)
        .map(String::from)
        .unwrap_or_else(|_| reference.to_string())
}

fn resolve_srcset(base_url: &Url, srcset: &str) -> String {
    srcset
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(|candidate| match candidate.rsplit_once(char::is_whitespace) {
            Some((url, descriptor)) => {
                format!("{} {}", resolve(base_url, url), descriptor.trim())
            }
            None => resolve(base_url, candidate),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
