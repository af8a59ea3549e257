//! url2md engine: fetching, HTML normalization, Markdown rendering, persistence
//! and the crawl runs that tie them together.
mod admonitions;
mod codeblock;
mod config;
mod converter;
mod crawl;
mod decode;
pub mod dom;
mod extract;
mod fetch;
mod frontmatter;
mod links;
pub mod normalize;
mod persist;
mod render;
mod sitemap;
mod types;

pub use admonitions::{callout_kind, convert_admonitions, CALLOUT_MARKER_ATTR};
pub use codeblock::{code_language, collapse_blank_lines, regroup_comments, render_code_block};
pub use config::{
    delay_from_secs, parse_seed_url, Clock, ConfigError, CrawlOptions,
    EngineConfig, DEFAULT_OUTPUT_DIR,
};
pub use converter::{ConvertError, ConvertedPage, PageConverter};
pub use crawl::{CrawlError, CrawlOrchestrator};
pub use decode::{decode_html, DecodeError, DecodePolicy, DecodedHtml};
pub use dom::PageDocument;
pub use extract::{extract_title, strip_site_suffix, PageTitle};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use frontmatter::build_markdown_document;
pub use links::LinkExtractor;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use render::{BlockRenderer, CodeBlockRenderer, Converter, MarkdownRenderer};
pub use sitemap::{parse_sitemap, ParsedSitemap, SitemapError, SitemapResolver};
pub use types::{ConversionResult, FailureKind, FetchError, FetchMetadata, FetchOutput};
