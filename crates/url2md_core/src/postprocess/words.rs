use super::protect::with_code_blocks_protected;

/// Joins words split by a rendering line wrap: a letter, a newline, then either a
/// lowercase letter or, after a capital, another capital.
///
/// `effi\ncace` becomes `efficace`, `WORD\nBREAK` becomes `WORDBREAK`. Lines starting
/// with Markdown syntax or digits are left alone, as is a capital following lowercase.
pub fn fix_broken_words(text: &str) -> String {
    with_code_blocks_protected(text, join_wrapped_letters)
}

fn join_wrapped_letters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            if let (Some(prev), Some(next)) = (out.chars().next_back(), chars.peek()) {
                let lower_tail = prev.is_alphabetic() && next.is_lowercase();
                let capital_run = prev.is_uppercase() && next.is_uppercase();
                if lower_tail || capital_run {
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::fix_broken_words;

    #[test]
    fn joins_split_words() {
        assert_eq!(fix_broken_words("effi\ncace"), "efficace");
        assert_eq!(fix_broken_words("Dockerfi\nle here"), "Dockerfile here");
        assert_eq!(fix_broken_words("a\nb\nc"), "abc");
    }

    #[test]
    fn joins_capital_runs() {
        assert_eq!(
            fix_broken_words("WORD\nBREAK and Some\nthing"),
            "WORDBREAK and Something"
        );
        assert_eq!(fix_broken_words("Intro\nNext"), "Intro\nNext");
    }

    #[test]
    fn accented_letters_count() {
        assert_eq!(fix_broken_words("problè\nme"), "problème");
    }

    #[test]
    fn structure_is_left_alone() {
        let text = "Intro\n\n- item\n## Heading\nNext Sentence\n1. one";
        assert_eq!(fix_broken_words(text), text);
    }

    #[test]
    fn code_is_protected() {
        let text = "```\nfoo\nbar\n```";
        assert_eq!(fix_broken_words(text), text);
    }
}
