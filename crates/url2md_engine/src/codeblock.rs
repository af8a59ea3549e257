//! `<pre>` blocks rendered as fenced code with their whitespace intact.

use ego_tree::NodeId;

use crate::dom::{DomNode, PageDocument};

/// Bare class names accepted as a language when no `language-*` class exists.
const KNOWN_LANGUAGES: &[&str] = &[
    "bash", "shell", "python", "js", "ts", "docker", "yaml", "json", "xml", "html", "css", "sql",
    "java", "c", "cpp", "go", "rust", "ruby", "php",
];

/// Languages whose `#` lines are comments worth regrouping.
const SHELL_LIKE: &[&str] = &[
    "", "bash", "shell", "sh", "zsh", "console", "docker", "dockerfile",
];

/// Renders `pre` as a fenced block: language tag, normalized blank lines, regrouped comments.
pub fn render_code_block(doc: &PageDocument, pre: NodeId) -> String {
    let language = code_language(doc, pre);
    let raw = code_text(doc, pre);
    let mut code = collapse_blank_lines(raw.trim_end_matches('\n'));
    if SHELL_LIKE.contains(&language.as_str()) {
        code = regroup_comments(&code);
    }
    let fence = fence_for(&code);
    format!("{fence}{language}\n{code}\n{fence}")
}

/// `language-*` on the `<pre>`, then on a nested `<code>`, then a known bare class name.
pub fn code_language(doc: &PageDocument, pre: NodeId) -> String {
    let code = doc
        .descendant_elements(pre)
        .into_iter()
        .find(|id| doc.tag(*id) == Some("code"));

    let prefixed = |id: NodeId| {
        doc.class_list(id)
            .into_iter()
            .find_map(|class| class.strip_prefix("language-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_lowercase)
    };
    let bare = |id: NodeId| {
        doc.class_list(id)
            .into_iter()
            .map(str::to_lowercase)
            .find(|class| KNOWN_LANGUAGES.contains(&class.as_str()))
    };

    prefixed(pre)
        .or_else(|| code.and_then(prefixed))
        .or_else(|| bare(pre))
        .or_else(|| code.and_then(bare))
        .unwrap_or_default()
}

/// Text of the block with `<br>` as a newline and CRLF folded.
fn code_text(doc: &PageDocument, pre: NodeId) -> String {
    let Some(node) = doc.node(pre) else {
        return String::new();
    };
    let mut text = String::new();
    for descendant in node.descendants() {
        match descendant.value() {
            DomNode::Text(t) => text.push_str(t),
            DomNode::Element(data) if data.name == "br" => text.push('\n'),
            _ => {}
        }
    }
    text.replace("\r\n", "\n")
}

/// Runs of three or more blank lines shrink to one.
pub fn collapse_blank_lines(code: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    for line in code.split('\n') {
        if line.trim().is_empty() {
            run.push(line);
            continue;
        }
        flush_blank_run(&mut out, &mut run);
        out.push(line);
    }
    flush_blank_run(&mut out, &mut run);
    out.join("\n")
}

fn flush_blank_run<'a>(out: &mut Vec<&'a str>, run: &mut Vec<&'a str>) {
    if run.len() >= 3 {
        out.push("");
    } else {
        out.extend(run.iter().copied());
    }
    run.clear();
}

/// Separates command groups: a blank line goes before a `#` comment that follows
/// a command, once an earlier comment has been seen and a command still follows.
pub fn regroup_comments(code: &str) -> String {
    let lines: Vec<&str> = code.split('\n').collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut seen_comment = false;

    for (i, line) in lines.iter().enumerate() {
        if is_comment(line) {
            let previous_is_command = i > 0 && is_command(lines[i - 1]);
            let command_follows = lines[i + 1..].iter().any(|l| is_command(l));
            if seen_comment && previous_is_command && command_follows {
                out.push("");
            }
            seen_comment = true;
        }
        out.push(line);
    }
    out.join("\n")
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') && !trimmed.starts_with("#!")
}

fn is_command(line: &str) -> bool {
    !line.trim().is_empty() && !is_comment(line)
}

/// At least three backticks and longer than any backtick run in the code.
fn fence_for(code: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in code.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_runs() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\n\nb"), "a\n\n\nb");
        assert_eq!(collapse_blank_lines("a\n  \n\t\n\nb"), "a\n\nb");
    }

    #[test]
    fn comments_start_new_groups() {
        let code = "# update\napt update\n# install\napt install git\n# trailing";
        assert_eq!(
            regroup_comments(code),
            "# update\napt update\n\n# install\napt install git\n# trailing"
        );
    }

    #[test]
    fn shebang_and_first_comment_are_untouched() {
        let code = "#!/bin/sh\necho a\n# note\necho b";
        assert_eq!(regroup_comments(code), code);
    }

    #[test]
    fn fence_grows_past_inner_backticks() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("``` nested ```"), "````");
    }
}
