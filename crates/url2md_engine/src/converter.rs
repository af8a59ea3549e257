use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info};
use url::Url;
use url2md_core::{output_path, FilenameStrategy, PostProcessor};

use crate::config::EngineConfig;
use crate::decode::{decode_html, DecodeError};
use crate::dom::PageDocument;
use crate::extract::{extract_title, PageTitle};
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::frontmatter::build_markdown_document;
use crate::links::LinkExtractor;
use crate::normalize::normalize;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::render::{Converter, MarkdownRenderer};
use crate::{ConversionResult, FetchError};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: DecodeError,
    },
    #[error("failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
}

/// One page rendered in memory, before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedPage {
    pub title: PageTitle,
    /// Frontmatter followed by the post-processed body.
    pub document: String,
    pub links: Vec<Url>,
}

/// Fetches a page and writes it as Markdown with frontmatter.
pub struct PageConverter {
    fetcher: Arc<dyn Fetcher>,
    renderer: Box<dyn Converter>,
    links: LinkExtractor,
    writer: AtomicFileWriter,
    config: EngineConfig,
}

impl PageConverter {
    pub fn new(config: EngineConfig) -> Self {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            renderer: Box::new(MarkdownRenderer::new()),
            links: LinkExtractor::new(),
            writer: AtomicFileWriter::new(),
            config,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Converter>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        Arc::clone(&self.fetcher)
    }

    /// Fetches `url`, converts it and writes `output_dir/<host>/<dirs>/<name>.md`.
    pub async fn convert(
        &self,
        url: &Url,
        output_dir: &Path,
        strategy: FilenameStrategy,
    ) -> Result<ConversionResult, ConvertError> {
        let fetched = self.fetcher.fetch(url.as_str()).await?;
        let decoded = decode_html(
            &fetched.bytes,
            fetched.metadata.content_type.as_deref(),
            self.config.fetch.decode,
        )
        .map_err(|source| ConvertError::Decode {
            url: url.to_string(),
            source,
        })?;
        engine_debug!("Decoded {} as {}", url, decoded.encoding_label);

        // Relative links resolve against where redirects ended up.
        let base = Url::parse(&fetched.metadata.final_url).unwrap_or_else(|_| url.clone());
        let page = self.convert_html(&decoded.html, url, &base);
        engine_info!("Title: {}", page.title.original);

        let path = output_path(url, &page.title.title, output_dir, strategy);
        self.writer
            .write(&path, &page.document)
            .map_err(|source| ConvertError::Persist {
                path: path.clone(),
                source,
            })?;
        engine_info!("Saved {}", path.display());

        Ok(ConversionResult {
            output_path: path,
            links: page.links,
        })
    }

    /// Title, normalize, links, render, post-process and frontmatter for an HTML string.
    ///
    /// `source` goes into the frontmatter; `base` resolves relative URLs.
    pub fn convert_html(&self, html: &str, source: &Url, base: &Url) -> ConvertedPage {
        let mut doc = PageDocument::parse(html);
        let title = extract_title(&doc);
        normalize(&mut doc, base);
        let links = self.links.extract(&doc, base);

        let markdown = self.renderer.to_markdown(&doc);
        let body = PostProcessor::new(title.title.as_str()).run(&markdown);
        let created = (self.config.created_at)();
        let document = build_markdown_document(source.as_str(), &title, &created, &body);

        ConvertedPage {
            title,
            document,
            links,
        }
    }
}
