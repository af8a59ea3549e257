use super::callouts::{callout_marker, split_quote};
use super::collapse_blank_runs;
use super::protect::with_code_blocks_protected;

/// Hints rendered under horizontally scrollable tables.
const SCROLL_HINTS: &[&str] = &[
    "glissez pour voir",
    "faites défiler pour voir",
    "scroll to see more",
    "swipe to see more",
];

/// Whitespace-only lines, trailing spaces, scroll hints and blank-line runs.
pub fn clean_markdown_output(text: &str) -> String {
    with_code_blocks_protected(text, |text| {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());

        for (i, line) in lines.iter().enumerate() {
            let (depth, rest) = split_quote(line);
            if is_scroll_hint(rest) {
                if depth > 0 && hint_is_whole_callout(&out, &lines[i + 1..], depth) {
                    out.pop();
                }
                continue;
            }
            out.push(line.trim_end().to_string());
        }

        collapse_blank_runs(&out.join("\n"))
    })
}

fn is_scroll_hint(rest: &str) -> bool {
    let normalized = rest
        .trim()
        .trim_end_matches(['.', '…', '→', ' '])
        .to_lowercase();
    SCROLL_HINTS.contains(&normalized.as_str())
}

/// True when the previous kept line is a callout marker and the callout ends after the hint.
fn hint_is_whole_callout(out: &[String], following: &[&str], depth: usize) -> bool {
    let Some(previous) = out.last() else {
        return false;
    };
    let (prev_depth, prev_rest) = split_quote(previous);
    if prev_depth != depth || callout_marker(prev_rest).is_none() {
        return false;
    }
    match following.first() {
        None => true,
        Some(next) => {
            let (next_depth, next_rest) = split_quote(next);
            next_depth < depth || (next_depth == depth && next_rest.trim().is_empty())
        }
    }
}
