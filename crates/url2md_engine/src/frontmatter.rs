use crate::extract::PageTitle;

/// Prepends the YAML header (`title`, `created`, `source`, `originaltitle`) to `body_markdown`.
pub fn build_markdown_document(
    source_url: &str,
    title: &PageTitle,
    created: &str,
    body_markdown: &str,
) -> String {
    format!(
        "---\ntitle: {title}\ncreated: {created}\nsource: {source_url}\noriginaltitle: {original}\n---\n\n{body_markdown}",
        title = yaml_quote(&title.title),
        original = yaml_quote(&title.original),
    )
}

fn yaml_quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_and_quoting() {
        let title = PageTitle {
            title: "Say \"hi\"".to_string(),
            original: "Say \"hi\" | Site".to_string(),
        };
        let doc = build_markdown_document("https://e.com/x", &title, "2024-05-01 10:00:00", "Body\n");
        assert_eq!(
            doc,
            "---\ntitle: \"Say \\\"hi\\\"\"\ncreated: 2024-05-01 10:00:00\nsource: https://e.com/x\noriginaltitle: \"Say \\\"hi\\\" | Site\"\n---\n\nBody\n"
        );
    }
}
