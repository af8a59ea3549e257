//! Batch and path-scoped crawl runs.
//!
//! Runs are sequential: fetch, convert, write, then the next URL. The delay
//! between requests and the gap between URLs are the only points where a
//! cancellation is observed besides the top of each iteration.

use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use tokio_util::sync::CancellationToken;
use url::Url;
use url2md_core::{CrawlStats, Frontier};

use crate::config::CrawlOptions;
use crate::converter::{ConvertError, PageConverter};

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// A page failed while `continue_on_error` was off.
    #[error("run stopped after {url} failed: {source}")]
    Aborted {
        url: String,
        #[source]
        source: ConvertError,
        stats: Box<CrawlStats>,
    },
}

impl CrawlError {
    pub fn stats(&self) -> &CrawlStats {
        match self {
            CrawlError::Aborted { stats, .. } => stats,
        }
    }
}

pub struct CrawlOrchestrator {
    converter: PageConverter,
    options: CrawlOptions,
    cancel: CancellationToken,
}

impl CrawlOrchestrator {
    pub fn new(converter: PageConverter, options: CrawlOptions) -> Self {
        Self {
            converter,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Converts every URL in order, pausing between URLs but not after the last.
    pub async fn process_batch(&self, urls: &[Url]) -> Result<CrawlStats, CrawlError> {
        let mut stats = CrawlStats::with_total(urls.len());
        engine_info!("Processing {} URLs", urls.len());

        for (index, url) in urls.iter().enumerate() {
            if self.cancel.is_cancelled() {
                stats.mark_interrupted();
                break;
            }
            engine_info!("[{}/{}] {}", index + 1, urls.len(), url);

            if let Err(err) = self.convert_one(url).await {
                engine_warn!("Failed {}: {}", url, err);
                stats.record_failure(url.as_str(), err.to_string());
                if !self.options.continue_on_error {
                    return Err(abort(url, err, stats));
                }
            } else {
                stats.record_success();
            }

            let is_last = index + 1 == urls.len();
            if !is_last && !self.pause().await {
                stats.mark_interrupted();
                break;
            }
        }

        stats.finish();
        Ok(stats)
    }

    /// Breadth-first crawl of pages under `seed`'s host and directory.
    ///
    /// Links are followed from pages at depth below `max_depth` (always when it
    /// is 0). `max_urls` caps how many pages are attempted.
    pub async fn crawl_by_path(&self, seed: &Url) -> Result<CrawlStats, CrawlError> {
        let max_depth = self.options.max_depth;
        let max_urls = self.options.max_urls;
        let mut frontier = Frontier::new(seed, max_depth);
        frontier.add_url(seed, 0);
        let mut stats = CrawlStats::new();

        engine_info!(
            "Crawling from {} (base path {}, max depth {})",
            seed,
            frontier.base_path(),
            max_depth
        );

        while !frontier.is_empty() {
            if self.cancel.is_cancelled() {
                stats.mark_interrupted();
                break;
            }
            if max_urls > 0 && stats.total >= max_urls {
                engine_info!("Reached the limit of {} URLs", max_urls);
                break;
            }
            let Some(entry) = frontier.get_next() else {
                break;
            };
            stats.total += 1;
            engine_info!(
                "[{}] depth {} | queued {} | {}",
                stats.total,
                entry.depth,
                frontier.size(),
                entry.url
            );

            let url = match Url::parse(&entry.url) {
                Ok(url) => url,
                Err(err) => {
                    stats.record_failure(entry.url.as_str(), err.to_string());
                    continue;
                }
            };
            match self.convert_one(&url).await {
                Ok(links) => {
                    stats.record_success();
                    if max_depth == 0 || entry.depth < max_depth {
                        let found = links.len();
                        let added = links
                            .iter()
                            .filter(|link| frontier.add_url(link, entry.depth + 1))
                            .count();
                        engine_info!("{} links found, {} queued", found, added);
                    }
                }
                Err(err) => {
                    engine_warn!("Failed {}: {}", url, err);
                    stats.record_failure(entry.url.as_str(), err.to_string());
                    if !self.options.continue_on_error {
                        return Err(abort(&url, err, stats));
                    }
                }
            }

            if !frontier.is_empty() && !self.pause().await {
                stats.mark_interrupted();
                break;
            }
        }

        stats.finish();
        Ok(stats)
    }

    /// Converts one page and returns the links it contains.
    async fn convert_one(&self, url: &Url) -> Result<Vec<Url>, ConvertError> {
        let config = self.converter.config();
        self.converter
            .convert(url, &config.output_dir, config.filename_strategy)
            .await
            .map(|result| result.links)
    }

    /// Sleeps for the configured delay; false when cancelled meanwhile.
    async fn pause(&self) -> bool {
        let delay = self.options.delay;
        if delay == Duration::ZERO {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

fn abort(url: &Url, source: ConvertError, mut stats: CrawlStats) -> CrawlError {
    stats.finish();
    CrawlError::Aborted {
        url: url.to_string(),
        source,
        stats: Box::new(stats),
    }
}
