//! url2md core: crawl frontier, run statistics, output naming and the Markdown
//! post-processing chain. Everything here is pure; IO lives in `url2md_engine`.
mod filename;
mod frontier;
pub mod postprocess;
mod stats;

pub use filename::{output_path, sanitize_filename, FilenameStrategy, UNTITLED};
pub use frontier::{normalize_url, Frontier, FrontierEntry};
pub use postprocess::{PostProcessor, PostStep, PIPELINE};
pub use stats::{CrawlStats, FailedUrl};
