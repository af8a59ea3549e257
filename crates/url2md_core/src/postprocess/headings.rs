use super::protect::with_code_blocks_protected;
use super::sections::heading;

/// Removes the first `# Title` line (it repeats the frontmatter title) and leading blank lines.
pub fn remove_first_heading(text: &str) -> String {
    with_code_blocks_protected(text, |text| {
        let mut lines: Vec<&str> = text.split('\n').collect();
        let first_h1 = lines
            .iter()
            .position(|line| matches!(heading(line), Some((1, title)) if !title.is_empty()));

        if let Some(index) = first_h1 {
            lines.remove(index);
            let blank_before = index > 0 && lines[index - 1].trim().is_empty();
            let blank_after = lines.get(index).is_some_and(|l| l.trim().is_empty());
            if blank_before && blank_after {
                lines.remove(index);
            }
        }

        lines.join("\n").trim_start_matches('\n').to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::remove_first_heading;

    #[test]
    fn removes_only_the_first_h1() {
        let text = "# Title\n\nIntro\n\n# Second\n\n## Sub";
        assert_eq!(remove_first_heading(text), "Intro\n\n# Second\n\n## Sub");
    }

    #[test]
    fn does_not_leave_a_double_blank_gap() {
        assert_eq!(remove_first_heading("Lead\n\n# T\n\nBody"), "Lead\n\nBody");
    }

    #[test]
    fn level_two_headings_are_not_h1() {
        let text = "## Only sub\ntext";
        assert_eq!(remove_first_heading(text), text);
    }

    #[test]
    fn shell_comments_in_code_are_not_headings() {
        let text = "```bash\n# install\napt install x\n```\n# Real";
        assert_eq!(remove_first_heading(text), "```bash\n# install\napt install x\n```");
    }
}
