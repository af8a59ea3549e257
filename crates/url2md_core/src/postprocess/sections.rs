use super::protect::with_code_blocks_protected;

/// Level-2 section titles that never carry article content (lowercase, no trailing `?`).
const UNWANTED_SECTIONS: &[&str] = &[
    "table of contents",
    "contents",
    "on this page",
    "sommaire",
    "table des matières",
    "sur cette page",
    "related articles",
    "related posts",
    "articles similaires",
    "articles connexes",
    "à lire aussi",
    "lire aussi",
    "read more",
    "you might also like",
    "vous aimerez aussi",
    "share this article",
    "share",
    "partager",
    "partager cet article",
    "comments",
    "commentaires",
    "leave a comment",
    "laisser un commentaire",
    "leave a reply",
    "newsletter",
    "subscribe",
    "abonnez-vous",
    "about the author",
    "à propos de l'auteur",
    "was this page helpful",
    "cette page vous a-t-elle été utile",
    "tags",
    "étiquettes",
];

/// ATX heading level and text, if `line` is a heading.
pub(crate) fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((level, rest.trim()))
}

/// Deletes denylisted `##` sections up to the next heading of level 1 or 2.
pub fn remove_unwanted_sections(text: &str) -> String {
    with_code_blocks_protected(text, |text| {
        let mut kept = Vec::new();
        let mut skipping_level: Option<usize> = None;

        for line in text.split('\n') {
            let parsed = heading(line);
            if let (Some(level), Some((current, _))) = (skipping_level, parsed) {
                if current <= level {
                    skipping_level = None;
                }
            }
            if let Some((2, title)) = parsed {
                if is_unwanted_title(title) {
                    skipping_level = Some(2);
                    continue;
                }
            }
            if skipping_level.is_none() {
                kept.push(line);
            }
        }
        kept.join("\n")
    })
}

fn is_unwanted_title(title: &str) -> bool {
    let normalized = title.trim().trim_end_matches('?').trim().to_lowercase();
    UNWANTED_SECTIONS.contains(&normalized.as_str())
}
