//! Markdown rendering over a normalized [`PageDocument`].
//!
//! Block elements become blocks separated by one blank line; inline content is
//! whitespace-collapsed into paragraphs. Nothing is escaped. Elements claimed by
//! a [`BlockRenderer`] bypass the default rendering; `<pre>` goes through
//! [`CodeBlockRenderer`].

use ego_tree::NodeId;

use crate::admonitions::CALLOUT_MARKER_ATTR;
use crate::codeblock::render_code_block;
use crate::dom::{DomNode, PageDocument};

const SKIPPED_TAGS: &[&str] = &[
    "head", "title", "script", "style", "svg", "template", "noscript", "input", "select",
    "textarea", "button", "option", "iframe", "canvas", "object", "embed", "map",
];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "dialog",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hgroup", "hr", "html", "li", "main", "nav", "ol", "p", "pre",
    "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

pub trait Converter: Send + Sync {
    fn to_markdown(&self, doc: &PageDocument) -> String;
}

/// Custom rendering for block elements.
pub trait BlockRenderer: Send + Sync {
    /// Markdown for `id`, or `None` to use the default rendering.
    fn render(&self, doc: &PageDocument, id: NodeId) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CodeBlockRenderer;

impl BlockRenderer for CodeBlockRenderer {
    fn render(&self, doc: &PageDocument, id: NodeId) -> Option<String> {
        (doc.tag(id) == Some("pre")).then(|| render_code_block(doc, id))
    }
}

pub struct MarkdownRenderer {
    block_renderers: Vec<Box<dyn BlockRenderer>>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            block_renderers: vec![Box::new(CodeBlockRenderer)],
        }
    }

    /// Registers a renderer consulted before the built-in ones.
    pub fn with_block_renderer(mut self, renderer: Box<dyn BlockRenderer>) -> Self {
        self.block_renderers.insert(0, renderer);
        self
    }

    pub fn render(&self, doc: &PageDocument) -> String {
        let blocks = self.container_blocks(doc, doc.root());
        join_blocks(&blocks, false).trim().to_string()
    }

    fn container_blocks(&self, doc: &PageDocument, id: NodeId) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut inline = Inline::default();

        for child in doc.children(id) {
            let Some(node) = doc.node(child) else { continue };
            match node.value() {
                DomNode::Text(text) => inline.push_text(text),
                DomNode::Element(data) => {
                    let tag = data.name.as_str();
                    if SKIPPED_TAGS.contains(&tag) {
                        continue;
                    }
                    if BLOCK_TAGS.contains(&tag) {
                        flush_paragraph(&mut blocks, std::mem::take(&mut inline));
                        blocks.extend(self.render_block(doc, child));
                    } else {
                        self.render_inline(doc, child, &mut inline);
                    }
                }
                DomNode::Document => {}
            }
        }
        flush_paragraph(&mut blocks, inline);
        blocks
    }

    fn render_block(&self, doc: &PageDocument, id: NodeId) -> Vec<Block> {
        if let Some(markdown) = self.block_renderers.iter().find_map(|r| r.render(doc, id)) {
            return vec![Block::text(markdown)];
        }

        let tag = doc.tag(id).unwrap_or_default();
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = usize::from(tag.as_bytes()[1] - b'0');
                let text = self.inline_text(doc, id).replace("\\\n", " ");
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Block::text(format!("{} {text}", "#".repeat(level)))]
                }
            }
            "p" if doc.attr(id, CALLOUT_MARKER_ATTR).is_some() => {
                let text = self.inline_text(doc, id);
                vec![Block {
                    text,
                    kind: BlockKind::CalloutMarker,
                }]
            }
            "summary" | "dt" => {
                let text = self.inline_text(doc, id).replace("\\\n", " ");
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Block::text(format!("**{text}**"))]
                }
            }
            "hr" => vec![Block::text("---".to_string())],
            "blockquote" => self.render_blockquote(doc, id).into_iter().collect(),
            "ul" | "ol" => self.render_list(doc, id).into_iter().collect(),
            "table" => self.render_table(doc, id).into_iter().collect(),
            "pre" => {
                let code = doc.text_content(id);
                vec![Block::text(format!("```\n{}\n```", code.trim_end_matches('\n')))]
            }
            _ => self.container_blocks(doc, id),
        }
    }

    fn render_blockquote(&self, doc: &PageDocument, id: NodeId) -> Option<Block> {
        let inner = join_blocks(&self.container_blocks(doc, id), false);
        if inner.trim().is_empty() {
            return None;
        }
        let quoted = inner
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        Some(Block::text(quoted))
    }

    fn render_list(&self, doc: &PageDocument, id: NodeId) -> Option<Block> {
        let ordered = doc.tag(id) == Some("ol");
        let mut number: usize = doc
            .attr(id, "start")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(1);

        let mut items: Vec<Vec<Block>> = Vec::new();
        for child in doc.children(id) {
            match doc.tag(child) {
                Some("li") => items.push(self.container_blocks(doc, child)),
                // Lists nested directly in a list belong to the previous item.
                Some(tag) if BLOCK_TAGS.contains(&tag) => {
                    let blocks = self.render_block(doc, child);
                    match items.last_mut() {
                        Some(last) => last.extend(blocks),
                        None => items.push(blocks),
                    }
                }
                _ => {}
            }
        }

        let mut rendered = Vec::new();
        for item in items {
            let content = join_blocks(&item, true);
            if content.trim().is_empty() {
                continue;
            }
            let marker = if ordered {
                let marker = format!("{number}. ");
                number += 1;
                marker
            } else {
                "- ".to_string()
            };
            let indent = " ".repeat(marker.len());
            let mut lines = content.split('\n');
            let mut text = format!("{marker}{}", lines.next().unwrap_or_default());
            for line in lines {
                text.push('\n');
                if !line.is_empty() {
                    text.push_str(&indent);
                    text.push_str(line);
                }
            }
            rendered.push(text);
        }

        if rendered.is_empty() {
            None
        } else {
            Some(Block {
                text: rendered.join("\n"),
                kind: BlockKind::List,
            })
        }
    }

    fn render_table(&self, doc: &PageDocument, table: NodeId) -> Option<Block> {
        let rows: Vec<Vec<String>> = doc
            .descendant_elements(table)
            .into_iter()
            .filter(|id| doc.tag(*id) == Some("tr") && closest_table(doc, *id) == Some(table))
            .map(|tr| {
                doc.children(tr)
                    .into_iter()
                    .filter(|cell| matches!(doc.tag(*cell), Some("td" | "th")))
                    .map(|cell| self.cell_text(doc, cell))
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();

        let width = rows.iter().map(Vec::len).max()?;
        let format_row = |cells: &[String]| {
            let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
            padded.resize(width, "");
            format!("| {} |", padded.join(" | "))
        };

        let mut lines = Vec::with_capacity(rows.len() + 1);
        let separator = vec!["---".to_string(); width];
        lines.push(format_row(rows[0].as_slice()));
        lines.push(format_row(separator.as_slice()));
        for row in &rows[1..] {
            lines.push(format_row(row.as_slice()));
        }
        Some(Block::text(lines.join("\n")))
    }

    fn cell_text(&self, doc: &PageDocument, cell: NodeId) -> String {
        let blocks = self.container_blocks(doc, cell);
        blocks
            .iter()
            .map(|b| b.text.replace("\\\n", " ").replace('\n', " "))
            .collect::<Vec<_>>()
            .join(" ")
            .replace('|', "\\|")
    }

    fn inline_text(&self, doc: &PageDocument, id: NodeId) -> String {
        let mut inline = Inline::default();
        self.render_children_inline(doc, id, &mut inline);
        inline.finish()
    }

    fn render_children_inline(&self, doc: &PageDocument, id: NodeId, out: &mut Inline) {
        for child in doc.children(id) {
            let Some(node) = doc.node(child) else { continue };
            match node.value() {
                DomNode::Text(text) => out.push_text(text),
                DomNode::Element(_) => self.render_inline(doc, child, out),
                DomNode::Document => {}
            }
        }
    }

    fn render_inline(&self, doc: &PageDocument, id: NodeId, out: &mut Inline) {
        let Some(tag) = doc.tag(id) else { return };
        if SKIPPED_TAGS.contains(&tag) {
            return;
        }
        match tag {
            "br" => out.hard_break(),
            "strong" | "b" => self.wrap_inline(doc, id, "**", out),
            "em" | "i" => self.wrap_inline(doc, id, "*", out),
            "code" | "kbd" | "samp" => {
                let text = doc.text_content(id);
                let code = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if code.is_empty() {
                    return;
                }
                let ticks = if code.contains('`') { "``" } else { "`" };
                let pad = if code.contains('`') { " " } else { "" };
                out.push_raw(&format!("{ticks}{pad}{code}{pad}{ticks}"));
            }
            "a" => {
                let mut inner = Inline::default();
                self.render_children_inline(doc, id, &mut inner);
                let text = inner.finish().replace("\\\n", " ");
                if text.is_empty() {
                    return;
                }
                match doc.attr(id, "href").map(str::trim) {
                    Some(href) if !href.is_empty() && !href.starts_with("javascript:") => {
                        out.push_raw(&format!("[{text}]({href})"));
                    }
                    _ => out.push_text(&text),
                }
            }
            "img" => {
                let Some(src) = doc.attr(id, "src").map(str::trim).filter(|s| !s.is_empty()) else {
                    return;
                };
                let alt = doc
                    .attr(id, "alt")
                    .unwrap_or_default()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
                out.push_raw(&format!("![{alt}]({src})"));
            }
            _ => self.render_children_inline(doc, id, out),
        }
    }

    /// Emphasis markers hug the text; edge whitespace moves outside them.
    fn wrap_inline(&self, doc: &PageDocument, id: NodeId, marker: &str, out: &mut Inline) {
        let mut inner = Inline::default();
        self.render_children_inline(doc, id, &mut inner);
        let raw = inner.text;
        let core = raw.trim();
        if core.is_empty() {
            out.push_text(&raw);
            return;
        }
        if raw.starts_with(' ') {
            out.push_text(" ");
        }
        out.push_raw(&format!("{marker}{core}{marker}"));
        if raw.ends_with(' ') {
            out.push_text(" ");
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for MarkdownRenderer {
    fn to_markdown(&self, doc: &PageDocument) -> String {
        self.render(doc)
    }
}

fn closest_table(doc: &PageDocument, id: NodeId) -> Option<NodeId> {
    let mut parent = doc.parent(id);
    while let Some(p) = parent {
        if doc.tag(p) == Some("table") {
            return Some(p);
        }
        parent = doc.parent(p);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Text,
    List,
    CalloutMarker,
}

#[derive(Debug, Clone)]
struct Block {
    text: String,
    kind: BlockKind,
}

impl Block {
    fn text(text: String) -> Self {
        Self {
            text,
            kind: BlockKind::Text,
        }
    }
}

/// Blank line between blocks, except right after a callout marker and before a
/// list nested in a list item.
fn join_blocks(blocks: &[Block], in_list_item: bool) -> String {
    let mut out = String::new();
    let mut previous: Option<BlockKind> = None;
    for block in blocks {
        if let Some(prev) = previous {
            let tight =
                prev == BlockKind::CalloutMarker || (in_list_item && block.kind == BlockKind::List);
            out.push_str(if tight { "\n" } else { "\n\n" });
        }
        out.push_str(&block.text);
        previous = Some(block.kind);
    }
    out
}

fn flush_paragraph(blocks: &mut Vec<Block>, inline: Inline) {
    let text = inline.finish();
    if !text.is_empty() {
        blocks.push(Block::text(text));
    }
}

/// Inline text under construction, with HTML whitespace collapsing.
#[derive(Debug, Default)]
struct Inline {
    text: String,
}

impl Inline {
    fn push_text(&mut self, raw: &str) {
        for c in raw.chars() {
            if c.is_whitespace() {
                if self.text.ends_with(' ') || self.text.ends_with('\n') {
                    continue;
                }
                self.text.push(' ');
            } else {
                self.text.push(c);
            }
        }
    }

    fn push_raw(&mut self, markdown: &str) {
        self.text.push_str(markdown);
    }

    /// Backslash hard break; repeated or leading breaks are dropped.
    fn hard_break(&mut self) {
        let kept = self.text.trim_end_matches(' ').len();
        self.text.truncate(kept);
        if self.text.is_empty() || self.text.ends_with('\n') {
            return;
        }
        self.text.push_str("\\\n");
    }

    fn finish(self) -> String {
        let mut text = self.text.as_str().trim_end_matches(' ');
        while let Some(stripped) = text.strip_suffix("\\\n") {
            text = stripped.trim_end_matches(' ');
        }
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(html: &str) -> String {
        MarkdownRenderer::new().render(&PageDocument::parse(html))
    }

    #[test]
    fn paragraphs_and_headings() {
        assert_eq!(
            render("<h2>Setup</h2><p>First   line\n of text.</p><p>Second.</p>"),
            "## Setup\n\nFirst line of text.\n\nSecond."
        );
    }

    #[test]
    fn inline_formatting() {
        assert_eq!(
            render(r#"<p>Use <strong>bold </strong>and <em>em</em>, <code>a  b</code> or <a href="https://x.io/">link</a>.</p>"#),
            "Use **bold** and *em*, `a b` or [link](https://x.io/)."
        );
    }

    #[test]
    fn line_breaks_become_hard_breaks() {
        assert_eq!(render("<p>one<br>two<br></p>"), "one\\\ntwo");
    }

    #[test]
    fn nested_lists_are_tight_and_indented() {
        let html = "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul><ol start=\"3\"><li>x</li><li>y</li></ol>";
        assert_eq!(render(html), "- a\n  - b\n- c\n\n3. x\n4. y");
    }

    #[test]
    fn blockquotes_prefix_every_line() {
        assert_eq!(
            render("<blockquote><p>a</p><p>b</p></blockquote>"),
            "> a\n>\n> b"
        );
    }

    #[test]
    fn tables_render_as_pipe_tables() {
        let html = "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>x|y</td></tr><tr><td>2</td></tr></table>";
        assert_eq!(
            render(html),
            "| A | B |\n| --- | --- |\n| 1 | x\\|y |\n| 2 |  |"
        );
    }

    #[test]
    fn images_and_skipped_elements() {
        assert_eq!(
            render(r#"<p><img src="https://x.io/a.png" alt="A pic"><svg><text>no</text></svg></p><template><p>t</p></template>"#),
            "![A pic](https://x.io/a.png)"
        );
    }

    #[test]
    fn details_summary_becomes_bold_paragraph() {
        assert_eq!(
            render("<details><summary>More info</summary><p>Hidden text</p></details>"),
            "**More info**\n\nHidden text"
        );
    }
}
