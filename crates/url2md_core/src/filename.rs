use std::path::{Path, PathBuf};

use url::Url;

pub const UNTITLED: &str = "untitled";
const MAX_FILENAME_CHARS: usize = 100;
const STRIPPED_EXTENSIONS: &[&str] = &["html", "htm", "php", "asp", "aspx", "jsp", "md"];

/// Which component names the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenameStrategy {
    /// Sanitized page title, or the last path segment when the page has no title.
    #[default]
    Title,
    /// Sanitized last URL path segment.
    UrlSlug,
}

/// Lowercase slug: punctuation dropped, whitespace and underscore runs turned into
/// one dash, outer dashes trimmed, then cut to 100 chars. `untitled` when nothing survives.
///
/// Dashes already in the input are kept as they are, so `a - b` gives `a---b`.
pub fn sanitize_filename(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut in_separator = false;
    for c in input.chars() {
        if c.is_whitespace() || c == '_' {
            if !in_separator {
                slug.push('-');
                in_separator = true;
            }
            continue;
        }
        if is_word_char(c) || c == '-' {
            slug.extend(c.to_lowercase());
            in_separator = false;
        }
    }

    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        return UNTITLED.to_string();
    }
    trimmed.chars().take(MAX_FILENAME_CHARS).collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `output_dir/host/<dirs>/<name>.md`, where `<dirs>` is the URL path minus its last segment.
pub fn output_path(url: &Url, title: &str, output_dir: &Path, strategy: FilenameStrategy) -> PathBuf {
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}_{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => "unknown-host".to_string(),
    };

    let segments: Vec<&str> = url
        .path()
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    let (dirs, last) = match segments.split_last() {
        Some((last, dirs)) => (dirs, Some(*last)),
        None => (&[][..], None),
    };

    let mut path = output_dir.join(host);
    for dir in dirs {
        path.push(dir);
    }

    let slug_source = last.map(strip_web_extension).unwrap_or("index");
    let stem = match strategy {
        FilenameStrategy::Title if title != UNTITLED && !title.trim().is_empty() => {
            sanitize_filename(title)
        }
        FilenameStrategy::Title | FilenameStrategy::UrlSlug => sanitize_filename(slug_source),
    };
    path.push(format!("{stem}.md"));
    path
}

fn strip_web_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && STRIPPED_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => segment,
    }
}
