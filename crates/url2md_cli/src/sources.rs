//! Gathers the URLs a run works on: a URL file, then a sitemap or the positional URLs.
//!
//! URLs typed by the user must be valid; a sitemap entry that is not an http(s)
//! page URL is skipped.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use engine_logging::{engine_error, engine_info, engine_warn};
use url::Url;
use url2md_engine::{parse_seed_url, ConfigError, SitemapResolver};

use crate::cli::Cli;

/// Non-empty lines of `contents` that are not `#` comments, trimmed.
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_url_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read URL file {}", path.display()))?;
    let urls = parse_url_list(&contents);
    engine_info!("{} URLs read from {}", urls.len(), path.display());
    Ok(urls)
}

/// File URLs first, then either the sitemap's pages or the positional URLs.
///
/// A sitemap that cannot be fetched or parsed is logged and contributes nothing.
/// An empty result is a configuration error.
pub async fn collect_urls(cli: &Cli, sitemaps: &SitemapResolver) -> anyhow::Result<Vec<Url>> {
    let mut urls = match &cli.file {
        Some(path) => user_urls(&read_url_file(path)?)?,
        None => Vec::new(),
    };

    if cli.sitemap {
        let Some(sitemap_url) = cli.urls.first() else {
            bail!("--sitemap needs the sitemap URL as the first argument");
        };
        match sitemaps
            .resolve(sitemap_url, cli.filter_path.as_deref())
            .await
        {
            Ok(found) => urls.extend(sitemap_page_urls(found)),
            Err(err) => engine_error!("{}", err),
        }
    } else {
        urls.extend(user_urls(&cli.urls)?);
    }

    if urls.is_empty() {
        return Err(ConfigError::NoUrls.into());
    }
    Ok(urls)
}

/// Fails on the first URL that is not an absolute http(s) URL.
fn user_urls(raw: &[String]) -> Result<Vec<Url>, ConfigError> {
    raw.iter().map(|url| parse_seed_url(url)).collect()
}

fn sitemap_page_urls(found: Vec<String>) -> Vec<Url> {
    found
        .into_iter()
        .filter_map(|loc| match parse_seed_url(&loc) {
            Ok(url) => Some(url),
            Err(err) => {
                engine_warn!("Skipping sitemap entry: {}", err);
                None
            }
        })
        .collect()
}
