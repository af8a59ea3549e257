use super::protect::with_code_blocks_protected;
use super::collapse_blank_runs;

/// Whole-line labels whose text starts with one of these is a heading permalink.
const SECTION_ANCHOR_PREFIXES: &[&str] = &["section intitul", "section titled"];
const TERMINAL_LABELS: &[&str] = &["fenêtre de terminal", "fenetre de terminal", "terminal window"];
const SKIP_LINK_LABELS: &[&str] = &[
    "aller au contenu",
    "aller au contenu principal",
    "skip to content",
    "skip to main content",
];

/// Drops whole-line boilerplate links left over from documentation themes.
pub fn remove_unwanted_links(text: &str) -> String {
    with_code_blocks_protected(text, |text| {
        let kept: Vec<&str> = text
            .split('\n')
            .map(|line| if is_unwanted_line(line) { "" } else { line })
            .collect();
        collapse_blank_runs(&kept.join("\n"))
    })
}

fn is_unwanted_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let (label, is_link) = match link_label(trimmed) {
        Some(label) => (label, true),
        None => (trimmed, false),
    };
    let label = label.trim().to_lowercase();

    if SECTION_ANCHOR_PREFIXES.iter().any(|p| label.starts_with(p)) {
        // The bare-text variant only counts when it quotes the section name.
        return is_link || label.contains(['«', '"', '“']);
    }
    if !is_link {
        return false;
    }
    TERMINAL_LABELS.contains(&label.as_str()) || SKIP_LINK_LABELS.contains(&label.as_str())
}

/// The text of a line that is exactly one `[label](target)` link.
fn link_label(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?;
    let close = inner.find("](")?;
    let (label, rest) = inner.split_at(close);
    let target = rest[2..].strip_suffix(')')?;
    if target.contains(['(', ')', ' ']) && !target.starts_with('<') {
        return None;
    }
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::remove_unwanted_links;

    #[test]
    fn drops_section_permalinks() {
        let text = "Intro\n[Section intitulée « Installer »](https://x.fr/doc#installer)\nBody";
        assert_eq!(remove_unwanted_links(text), "Intro\n\nBody");
    }

    #[test]
    fn drops_bare_section_label() {
        let text = "A\n\nSection titled “Setup”\n\nB";
        assert_eq!(remove_unwanted_links(text), "A\n\nB");
    }

    #[test]
    fn drops_terminal_and_skip_links() {
        let text = "[Fenêtre de terminal](https://x/#t)\n\n[Skip to content](#main)\nText";
        assert_eq!(remove_unwanted_links(text), "\n\nText");
    }

    #[test]
    fn keeps_ordinary_links_and_prose() {
        let text = "[Docs](https://x/docs)\nTerminal window setup is easy";
        assert_eq!(remove_unwanted_links(text), text);
    }
}
