use super::protect::{is_placeholder, with_code_blocks_protected};

/// Only the top of the document is scanned; body prose is never touched.
const METADATA_WINDOW: usize = 10;

const DIFFICULTY_BADGES: &[&str] = &[
    "beginner",
    "intermediate",
    "advanced",
    "expert",
    "easy",
    "medium",
    "hard",
    "débutant",
    "debutant",
    "intermédiaire",
    "intermediaire",
    "avancé",
    "avance",
    "facile",
    "difficile",
];

/// Drops badge, tag and repeated-title lines among the first ten non-blank lines.
pub fn remove_initial_metadata(text: &str, title: &str) -> String {
    with_code_blocks_protected(text, |text| {
        let title = title.trim().to_lowercase();
        let mut seen = 0;
        let mut kept = Vec::new();
        for line in text.split('\n') {
            if line.trim().is_empty() || seen >= METADATA_WINDOW {
                kept.push(line);
                continue;
            }
            seen += 1;
            if !is_metadata_line(line, &title) {
                kept.push(line);
            }
        }
        kept.join("\n")
    })
}

fn is_metadata_line(line: &str, title: &str) -> bool {
    if is_placeholder(line) {
        return false;
    }
    let trimmed = line.trim();
    let lowered = trimmed.to_lowercase();

    let indented = line.starts_with([' ', '\t']);
    if indented && !title.is_empty() && lowered == title {
        return true;
    }
    if DIFFICULTY_BADGES.contains(&lowered.as_str()) {
        return true;
    }
    is_tag_line(trimmed)
}

/// Three or more bare alphabetic words, e.g. `docs informational published beginner`.
fn is_tag_line(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    words.len() >= 3
        && words
            .iter()
            .all(|w| w.chars().all(char::is_alphabetic))
}

#[cfg(test)]
mod tests {
    use super::remove_initial_metadata;

    #[test]
    fn removes_badges_tags_and_repeated_title() {
        let text = "  Getting Started\nbeginner\ndocs tutorial published\nReal content here.";
        assert_eq!(
            remove_initial_metadata(text, "Getting Started"),
            "Real content here."
        );
    }

    #[test]
    fn unindented_title_line_is_kept() {
        let text = "Getting Started\nBody.";
        assert_eq!(remove_initial_metadata(text, "Getting Started"), text);
    }

    #[test]
    fn lines_past_the_window_are_kept() {
        let mut lines: Vec<String> = (0..10).map(|i| format!("Line {i}.")).collect();
        lines.push("these three words".to_string());
        let text = lines.join("\n");
        assert_eq!(remove_initial_metadata(&text, "T"), text);
    }

    #[test]
    fn markdown_syntax_disqualifies_tag_lines() {
        let text = "## Three word heading\n- list item here\nsome *emphasis* here";
        assert_eq!(remove_initial_metadata(text, "T"), text);
    }
}
