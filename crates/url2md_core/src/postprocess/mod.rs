//! Ordered text fixups applied to rendered Markdown.
//!
//! Every step hides fenced code blocks behind placeholders before touching the
//! text, so code content leaves the chain byte-for-byte unchanged.
mod boilerplate;
mod callouts;
mod cleanup;
mod headings;
mod metadata;
mod protect;
mod sections;
mod words;

pub use boilerplate::remove_unwanted_links;
pub use callouts::dedupe_nested_callouts;
pub use cleanup::clean_markdown_output;
pub use headings::remove_first_heading;
pub use metadata::remove_initial_metadata;
pub use protect::{protect_code_blocks, with_code_blocks_protected, ProtectedText};
pub use sections::remove_unwanted_sections;
pub use words::fix_broken_words;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStep {
    BrokenWords,
    UnwantedLinks,
    InitialMetadata,
    UnwantedSections,
    NestedCallouts,
    Cleanup,
    FirstHeading,
}

/// Section removal precedes cleanup so its leftovers get collapsed; callouts are
/// flattened before cleanup collapses blank lines around them.
pub const PIPELINE: [PostStep; 8] = [
    PostStep::BrokenWords,
    PostStep::UnwantedLinks,
    PostStep::InitialMetadata,
    PostStep::UnwantedSections,
    PostStep::NestedCallouts,
    PostStep::Cleanup,
    PostStep::FirstHeading,
    PostStep::BrokenWords,
];

/// Runs [`PIPELINE`] for one page.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    title: String,
}

impl PostProcessor {
    /// `title` is the page title, used to spot repeated title lines near the top.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn apply(&self, step: PostStep, text: &str) -> String {
        match step {
            PostStep::BrokenWords => fix_broken_words(text),
            PostStep::UnwantedLinks => remove_unwanted_links(text),
            PostStep::InitialMetadata => remove_initial_metadata(text, &self.title),
            PostStep::UnwantedSections => remove_unwanted_sections(text),
            PostStep::NestedCallouts => dedupe_nested_callouts(text),
            PostStep::Cleanup => clean_markdown_output(text),
            PostStep::FirstHeading => remove_first_heading(text),
        }
    }

    /// Output ends with exactly one newline, or is empty.
    pub fn run(&self, markdown: &str) -> String {
        let normalized = markdown.replace("\r\n", "\n");
        let processed = PIPELINE
            .iter()
            .fold(normalized, |text, step| self.apply(*step, &text));
        let trimmed = processed.trim_end();
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}\n")
        }
    }
}

/// Three or more consecutive newlines become exactly two.
pub(crate) fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::collapse_blank_runs;

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        assert_eq!(collapse_blank_runs("a\n\n\n\nb\n\nc\nd"), "a\n\nb\n\nc\nd");
    }
}
