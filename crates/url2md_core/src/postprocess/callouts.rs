use super::protect::with_code_blocks_protected;

/// How far past a marker line a nested marker may appear.
const NESTED_MARKER_LOOKAHEAD: usize = 3;
const MAX_COLLAPSE_ROUNDS: usize = 8;

/// Blockquote depth and the content after the `>` prefixes.
pub(crate) fn split_quote(line: &str) -> (usize, &str) {
    let mut depth = 0;
    let mut rest = line;
    loop {
        let indent = rest.len() - rest.trim_start_matches(' ').len();
        if indent > 3 {
            break;
        }
        match rest[indent..].strip_prefix('>') {
            Some(after) => {
                depth += 1;
                rest = after.strip_prefix(' ').unwrap_or(after);
            }
            None => break,
        }
    }
    if depth == 0 {
        (0, line)
    } else {
        (depth, rest)
    }
}

/// Inverse of [`split_quote`]; blank quoted lines are written as a bare `>`.
pub(crate) fn quote_line(depth: usize, rest: &str) -> String {
    if depth == 0 {
        rest.to_string()
    } else if rest.is_empty() {
        format!("{}>", "> ".repeat(depth - 1))
    } else {
        format!("{}{}", "> ".repeat(depth), rest)
    }
}

/// The callout type of a `[!TYPE]` or `[!TYPE] Title` line.
pub(crate) fn callout_marker(rest: &str) -> Option<&str> {
    let inner = rest.trim_start().strip_prefix("[!")?;
    let close = inner.find(']')?;
    let kind = &inner[..close];
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    Some(kind)
}

/// Collapses `> [!X]` wrappers whose body opens with a deeper `> > [!Y]` marker.
///
/// The nested marker replaces the outer one and everything quoted deeper than
/// the outer callout moves up one level.
pub fn dedupe_nested_callouts(text: &str) -> String {
    with_code_blocks_protected(text, |text| {
        let mut current = text.to_string();
        for _ in 0..MAX_COLLAPSE_ROUNDS {
            let lines: Vec<&str> = current.split('\n').collect();
            let (collapsed, changed) = collapse_once(&lines);
            if !changed {
                break;
            }
            current = collapsed.join("\n");
        }
        current
    })
}

fn collapse_once(lines: &[&str]) -> (Vec<String>, bool) {
    let mut out = Vec::with_capacity(lines.len());
    let mut changed = false;
    let mut promote_above: Option<usize> = None;
    let mut i = 0;

    while i < lines.len() {
        let (depth, rest) = split_quote(lines[i]);

        if let Some(outer) = promote_above {
            if depth > outer {
                out.push(quote_line(depth - 1, rest));
                i += 1;
                continue;
            }
            promote_above = None;
        }

        if depth > 0 && callout_marker(rest).is_some() {
            if let Some(nested) = find_nested_marker(lines, i, depth) {
                for line in &lines[i + 1..nested] {
                    let (d, r) = split_quote(line);
                    if d == 0 && !r.trim().is_empty() {
                        out.push((*line).to_string());
                    }
                }
                changed = true;
                promote_above = Some(depth);
                i = nested;
                continue;
            }
        }

        out.push(lines[i].to_string());
        i += 1;
    }

    (out, changed)
}

fn find_nested_marker(lines: &[&str], marker_index: usize, depth: usize) -> Option<usize> {
    let end = (marker_index + NESTED_MARKER_LOOKAHEAD).min(lines.len().saturating_sub(1));
    for (j, line) in lines.iter().enumerate().take(end + 1).skip(marker_index + 1) {
        let (d, rest) = split_quote(line);
        let blank = rest.trim().is_empty();
        if d == depth + 1 && callout_marker(rest).is_some() {
            return Some(j);
        }
        let spacer = (d == depth || d == depth + 1) && blank;
        let interleaved = d == 0 && !blank;
        if !spacer && !interleaved {
            return None;
        }
    }
    None
}
