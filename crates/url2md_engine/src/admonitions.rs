//! Documentation-theme admonitions rewritten as `> [!TYPE]` callouts.

use ego_tree::NodeId;
use engine_logging::engine_debug;

use crate::dom::PageDocument;

/// Attribute set on the paragraph that carries the `[!TYPE]` marker.
pub const CALLOUT_MARKER_ATTR: &str = "data-callout-marker";

const CANDIDATE_TAGS: &[&str] = &["div", "aside", "blockquote", "section"];
const TITLE_CLASS_KEYWORDS: &[&str] = &["title", "heading", "header"];

/// Checked in order; the generic `admonition` class only applies when nothing more specific matched.
const CALLOUT_KINDS: &[(&str, &str)] = &[
    ("note", "NOTE"),
    ("info", "NOTE"),
    ("hint", "NOTE"),
    ("tip", "TIP"),
    ("success", "TIP"),
    ("warning", "WARNING"),
    ("caution", "WARNING"),
    ("attention", "WARNING"),
    ("danger", "DANGER"),
    ("error", "DANGER"),
    ("critical", "DANGER"),
    ("example", "EXAMPLE"),
    ("question", "QUESTION"),
    ("faq", "QUESTION"),
    ("quote", "QUOTE"),
    ("cite", "QUOTE"),
    ("admonition", "NOTE"),
];

/// Callout type for a class list, matching whole `-`/`_` separated class parts.
pub fn callout_kind<'a, I>(classes: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let parts: Vec<String> = classes
        .into_iter()
        .flat_map(|class| class.split(['-', '_']))
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect();
    CALLOUT_KINDS
        .iter()
        .find(|(keyword, _)| parts.iter().any(|part| part == keyword))
        .map(|(_, kind)| *kind)
}

pub fn convert_admonitions(doc: &mut PageDocument) {
    let mut converted: Vec<NodeId> = Vec::new();

    for id in doc.elements() {
        if !doc.is_attached(id) {
            continue;
        }
        if !doc.tag(id).is_some_and(|tag| CANDIDATE_TAGS.contains(&tag)) {
            continue;
        }
        if doc.has_ancestor_tag(id, "blockquote") || inside_any(doc, id, &converted) {
            continue;
        }
        let Some(kind) = callout_kind(doc.class_list(id)) else {
            continue;
        };

        let title = take_title(doc, id).filter(|t| !t.eq_ignore_ascii_case(kind));
        let marker_text = match title {
            Some(title) => format!("[!{kind}] {title}"),
            None => format!("[!{kind}]"),
        };

        let quote = doc.create_element("blockquote");
        let marker = doc.create_element("p");
        doc.set_attr(marker, CALLOUT_MARKER_ATTR, kind);
        let text = doc.create_text(marker_text);
        doc.append_child(marker, text);
        doc.append_child(quote, marker);
        for child in doc.children(id) {
            doc.append_child(quote, child);
        }
        doc.replace_with(id, quote);
        engine_debug!("Converted admonition to [!{}] callout", kind);
        converted.push(id);
    }
}

fn inside_any(doc: &PageDocument, id: NodeId, ancestors: &[NodeId]) -> bool {
    let mut parent = doc.parent(id);
    while let Some(p) = parent {
        if ancestors.contains(&p) {
            return true;
        }
        parent = doc.parent(p);
    }
    false
}

/// Detaches the first titled descendant and returns its text.
fn take_title(doc: &mut PageDocument, id: NodeId) -> Option<String> {
    let title_id = doc.descendant_elements(id).into_iter().find(|child| {
        doc.attr(*child, "class").is_some_and(|class| {
            let class = class.to_lowercase();
            TITLE_CLASS_KEYWORDS.iter().any(|k| class.contains(k))
        })
    })?;
    let text = doc
        .text_content(title_id)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    doc.remove(title_id);
    (!text.is_empty()).then_some(text)
}
