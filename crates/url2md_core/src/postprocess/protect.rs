//! Fenced code regions swapped for opaque line tokens while text passes run.

const TOKEN_MARK: char = '\u{E000}';

/// Markdown with every top-level fenced block replaced by a placeholder line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedText {
    pub text: String,
    blocks: Vec<String>,
}

impl ProtectedText {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Puts the original blocks back; placeholders dropped by a pass stay dropped.
    pub fn restore(self, text: &str) -> String {
        let mut out = Vec::new();
        for line in text.split('\n') {
            match parse_token(line) {
                Some(index) if index < self.blocks.len() => out.push(self.blocks[index].as_str()),
                _ => out.push(line),
            }
        }
        out.join("\n")
    }
}

/// Runs `pass` over `text` with fenced code blocks hidden from it.
pub fn with_code_blocks_protected<F>(text: &str, pass: F) -> String
where
    F: FnOnce(&str) -> String,
{
    let protected = protect_code_blocks(text);
    if protected.block_count() == 0 {
        return pass(text);
    }
    let transformed = pass(&protected.text);
    protected.restore(&transformed)
}

pub fn protect_code_blocks(text: &str) -> ProtectedText {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(fence) = opening_fence(lines[i]) else {
            out.push(lines[i].to_string());
            i += 1;
            continue;
        };

        // An unclosed fence runs to the end of the document.
        let mut end = lines.len() - 1;
        for (j, line) in lines.iter().enumerate().skip(i + 1) {
            if fence.closes(line) {
                end = j;
                break;
            }
        }

        out.push(token(blocks.len()));
        blocks.push(lines[i..=end].join("\n"));
        i = end + 1;
    }

    ProtectedText {
        text: out.join("\n"),
        blocks,
    }
}

pub fn is_placeholder(line: &str) -> bool {
    parse_token(line).is_some()
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Closing fences of list-item code sit at the item's continuation indent.
    fn closes(&self, line: &str) -> bool {
        let rest = line.trim_start_matches(' ');
        let run = rest.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && rest[run * self.marker.len_utf8()..].trim().is_empty()
    }
}

fn opening_fence(line: &str) -> Option<Fence> {
    let rest = strip_list_markers(line);
    let marker = rest.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let len = rest.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    // Backtick fences cannot carry backticks in their info string.
    if marker == '`' && rest[len..].contains('`') {
        return None;
    }
    Some(Fence { marker, len })
}

/// `  - 1. ```bash` -> ```` ```bash ````: indentation and any list markers in front of a fence.
fn strip_list_markers(line: &str) -> &str {
    let mut rest = line.trim_start_matches(' ');
    while let Some(after) = strip_list_marker(rest) {
        rest = after.trim_start_matches(' ');
    }
    rest
}

fn strip_list_marker(text: &str) -> Option<&str> {
    if let Some(after) = ["- ", "* ", "+ "].iter().find_map(|m| text.strip_prefix(m)) {
        return Some(after);
    }
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    text[digits..]
        .strip_prefix(". ")
        .or_else(|| text[digits..].strip_prefix(") "))
}

fn token(index: usize) -> String {
    format!("{TOKEN_MARK}CODE{index}{TOKEN_MARK}")
}

fn parse_token(line: &str) -> Option<usize> {
    line.strip_prefix(TOKEN_MARK)?
        .strip_suffix(TOKEN_MARK)?
        .strip_prefix("CODE")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_blocks_round_trip_through_placeholders() {
        let text = "intro\n```bash\n  echo hi\n\n\n```\noutro";
        let protected = protect_code_blocks(text);
        assert_eq!(protected.block_count(), 1);
        assert!(!protected.text.contains("echo"));
        let restored = protected.clone().restore(&protected.text);
        assert_eq!(restored, text);
    }

    #[test]
    fn closing_fence_must_be_at_least_as_long() {
        let text = "````\n```\ninner\n```\n````\nafter";
        let protected = protect_code_blocks(text);
        assert_eq!(protected.block_count(), 1);
        assert_eq!(protected.text.split('\n').nth(1), Some("after"));
    }

    #[test]
    fn unclosed_fence_swallows_the_rest() {
        let protected = protect_code_blocks("a\n~~~\nb\nc");
        assert_eq!(protected.text.split('\n').count(), 2);
    }

    #[test]
    fn passes_never_see_code() {
        let text = "Hello\n```\nword\nbreak\n```";
        let result = with_code_blocks_protected(text, |t| t.replace("word", "WORD"));
        assert_eq!(result, text);
    }

    #[test]
    fn fences_after_list_markers_open_blocks() {
        assert!(opening_fence("- ```bash").is_some());
        assert!(opening_fence("  12. ```").is_some());
        assert!(opening_fence("    ~~~").is_some());
        assert!(opening_fence("- plain item").is_none());
        assert!(opening_fence("-```").is_none());
    }

    #[test]
    fn list_item_block_closes_at_its_continuation_indent() {
        let text = "- ```\n  effi\n  cace\n  ```\n\nmid\n\n```\nword\n```";
        let protected = protect_code_blocks(text);
        assert_eq!(protected.block_count(), 2);
        assert_eq!(protected.text.split('\n').nth(2), Some("mid"));
    }
}
