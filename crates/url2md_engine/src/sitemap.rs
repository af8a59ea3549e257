//! Sitemap and sitemap-index expansion.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

use crate::fetch::Fetcher;
use crate::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    #[error("failed to fetch sitemap {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to parse sitemap {url}: {message}")]
    Parse { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSitemap {
    /// `<sitemapindex>`: locations of child sitemaps.
    Index(Vec<String>),
    /// `<urlset>`: page locations.
    UrlSet(Vec<String>),
}

type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>, SitemapError>> + Send + 'a>>;

pub struct SitemapResolver {
    fetcher: Arc<dyn Fetcher>,
}

impl SitemapResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Page URLs listed by `sitemap_url`, following index files recursively.
    ///
    /// With `filter_path`, only pages whose path starts with it are kept. A child
    /// sitemap that fails is logged and skipped; a failing top-level sitemap is an
    /// error. Each sitemap URL is fetched at most once.
    pub async fn resolve(
        &self,
        sitemap_url: &str,
        filter_path: Option<&str>,
    ) -> Result<Vec<String>, SitemapError> {
        let mut visited = HashSet::new();
        let urls = self
            .resolve_one(sitemap_url.to_string(), filter_path, &mut visited)
            .await?;
        if let Some(filter) = filter_path {
            engine_info!("{} URLs match path filter '{}'", urls.len(), filter);
        }
        Ok(urls)
    }

    fn resolve_one<'a>(
        &'a self,
        sitemap_url: String,
        filter_path: Option<&'a str>,
        visited: &'a mut HashSet<String>,
    ) -> ResolveFuture<'a> {
        Box::pin(async move {
            if !visited.insert(sitemap_url.clone()) {
                engine_debug!("Sitemap {} already resolved, skipping", sitemap_url);
                return Ok(Vec::new());
            }

            let output = self
                .fetcher
                .fetch(&sitemap_url)
                .await
                .map_err(|source| SitemapError::Fetch {
                    url: sitemap_url.clone(),
                    source,
                })?;
            let xml = String::from_utf8_lossy(&output.bytes);
            let parsed = parse_sitemap(&xml).map_err(|message| SitemapError::Parse {
                url: sitemap_url.clone(),
                message,
            })?;

            match parsed {
                ParsedSitemap::Index(children) => {
                    engine_info!(
                        "Sitemap index {} lists {} sitemaps",
                        sitemap_url,
                        children.len()
                    );
                    let mut urls = Vec::new();
                    for child in children {
                        match self.resolve_one(child.clone(), filter_path, visited).await {
                            Ok(found) => urls.extend(found),
                            Err(err) => engine_warn!("Skipping child sitemap {}: {}", child, err),
                        }
                    }
                    Ok(urls)
                }
                ParsedSitemap::UrlSet(locations) => {
                    engine_info!("{} URLs found in {}", locations.len(), sitemap_url);
                    Ok(locations
                        .into_iter()
                        .filter(|loc| filter_path.is_none_or(|filter| path_matches(loc, filter)))
                        .collect())
                }
            }
        })
    }
}

fn path_matches(location: &str, filter: &str) -> bool {
    Url::parse(location).is_ok_and(|url| url.path().starts_with(filter))
}

/// Classifies a sitemap document and collects its `<loc>` values.
///
/// Any `<sitemap>` element makes the document an index.
pub fn parse_sitemap(xml: &str) -> Result<ParsedSitemap, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut index_locs = Vec::new();
    let mut url_locs = Vec::new();
    let mut is_index = false;
    let mut current_loc: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"sitemap" {
                    is_index = true;
                }
                if name == b"loc" {
                    current_loc = Some(String::new());
                }
                path.push(name);
            }
            Ok(Event::Text(e)) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&e.unescape().map_err(|err| err.to_string())?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    let parent = path.len().checked_sub(2).map(|i| path[i].as_slice());
                    if let Some(loc) = current_loc.take().map(|l| l.trim().to_string()) {
                        match parent {
                            Some(b"sitemap") if !loc.is_empty() => index_locs.push(loc),
                            Some(b"url") if !loc.is_empty() => url_locs.push(loc),
                            _ => {}
                        }
                    }
                }
                path.pop();
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"sitemap" {
                    is_index = true;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.to_string()),
            _ => {}
        }
        buf.clear();
    }

    Ok(if is_index {
        ParsedSitemap::Index(index_locs)
    } else {
        ParsedSitemap::UrlSet(url_locs)
    })
}
