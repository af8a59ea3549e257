use std::collections::{HashSet, VecDeque};

use url::Url;

/// A pending crawl target: normalized URL plus the depth it was discovered at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
}

/// Breadth-first crawl queue scoped to the seed's host and path prefix.
///
/// `add` is the only mutation that touches the visited set, so one owner of the
/// frontier gets an atomic check-and-insert per URL.
#[derive(Debug, Clone)]
pub struct Frontier {
    base_domain: String,
    base_path: String,
    max_depth: usize,
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
}

impl Frontier {
    /// `max_depth == 0` means unlimited.
    pub fn new(seed: &Url, max_depth: usize) -> Self {
        let trimmed = seed.path().trim_end_matches('/');
        let base_path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("{trimmed}/")
        };
        Self {
            base_domain: authority(seed),
            base_path,
            max_depth,
            queue: VecDeque::new(),
            visited: HashSet::new(),
        }
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parses and enqueues `url`; unparsable input is rejected like any other filter miss.
    pub fn add(&mut self, url: &str, depth: usize) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.add_url(&parsed, depth),
            Err(_) => false,
        }
    }

    pub fn add_url(&mut self, url: &Url, depth: usize) -> bool {
        let normalized = normalize_url(url);
        if self.visited.contains(&normalized) {
            return false;
        }
        if authority(url) != self.base_domain {
            return false;
        }
        if !self.in_scope(url.path()) {
            return false;
        }
        if self.max_depth > 0 && depth > self.max_depth {
            return false;
        }

        self.visited.insert(normalized.clone());
        self.queue.push_back(FrontierEntry {
            url: normalized,
            depth,
        });
        true
    }

    /// FIFO pop; depth is carried along, never used for ordering.
    pub fn get_next(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn size(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    // `/blog` is the seed directory itself and stays in scope for `/blog/`.
    fn in_scope(&self, path: &str) -> bool {
        let with_slash = format!("{}/", path.trim_end_matches('/'));
        with_slash.starts_with(&self.base_path)
    }
}

/// Canonical dedupe key: `scheme://host[:port]/path?query`, no fragment, no trailing slash.
pub fn normalize_url(url: &Url) -> String {
    let path = url.path().trim_end_matches('/');
    let mut normalized = format!("{}://{}{}", url.scheme(), authority(url), path);
    if let Some(query) = url.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    normalized
}

fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}
