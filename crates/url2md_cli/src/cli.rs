//! Command-line arguments for the `url2md` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use engine_logging::{LogDestination, LOG_FILE_NAME};
use log::LevelFilter;
use url2md_core::FilenameStrategy;
use url2md_engine::DEFAULT_OUTPUT_DIR;

/// Converts web pages to Markdown files with YAML frontmatter.
#[derive(Parser, Debug, Clone)]
#[command(name = "url2md", version, about, long_about = None)]
pub struct Cli {
    /// Page URLs to convert; with --sitemap, the first one is the sitemap.
    pub urls: Vec<String>,

    /// Directory that receives one `<host>/` tree per site
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Follow links under the first URL's directory
    #[arg(short, long)]
    pub crawl: bool,

    /// Link depth to follow when crawling (0 = unlimited)
    #[arg(short = 'd', long, default_value_t = 1)]
    pub max_depth: usize,

    /// Maximum pages to fetch when crawling (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_urls: usize,

    /// Treat the first URL as a sitemap or sitemap index
    #[arg(short, long)]
    pub sitemap: bool,

    /// Keep only sitemap entries whose path starts with this prefix
    #[arg(long, requires = "sitemap")]
    pub filter_path: Option<String>,

    /// Read URLs from a file, one per line; `#` starts a comment line
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Seconds to wait between requests
    #[arg(long, default_value_t = 1.0)]
    pub delay: f64,

    /// How output files are named
    #[arg(long, value_enum, default_value = "title")]
    pub filename: FilenameArg,

    /// Stop at the first page that fails
    #[arg(long)]
    pub stop_on_error: bool,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write the log to a file (default ./url2md.log)
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = LOG_FILE_NAME
    )]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilenameArg {
    /// Sanitized page title
    Title,
    /// Last URL path segment
    Url,
}

impl From<FilenameArg> for FilenameStrategy {
    fn from(arg: FilenameArg) -> Self {
        match arg {
            FilenameArg::Title => FilenameStrategy::Title,
            FilenameArg::Url => FilenameStrategy::UrlSlug,
        }
    }
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("url2md").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["https://example.com/"]);
        assert_eq!(cli.urls, vec!["https://example.com/"]);
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert!(!cli.crawl);
        assert_eq!(cli.max_depth, 1);
        assert_eq!(cli.max_urls, 0);
        assert_eq!(cli.delay, 1.0);
        assert_eq!(cli.filename, FilenameArg::Title);
        assert!(!cli.stop_on_error);
        assert_eq!(cli.log_level(), LevelFilter::Info);
        assert_eq!(cli.log_destination(), LogDestination::Terminal);
    }

    #[test]
    fn crawl_flags() {
        let cli = parse(&[
            "-c", "-d", "0", "--max-urls", "50", "--delay", "0.5", "-o", "notes",
            "--filename", "url", "--stop-on-error", "-v", "--log-file",
            "https://example.com/blog/",
        ]);
        assert!(cli.crawl);
        assert_eq!(cli.max_depth, 0);
        assert_eq!(cli.max_urls, 50);
        assert_eq!(cli.delay, 0.5);
        assert_eq!(cli.output_dir, PathBuf::from("notes"));
        assert_eq!(FilenameStrategy::from(cli.filename), FilenameStrategy::UrlSlug);
        assert!(cli.stop_on_error);
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert_eq!(
            cli.log_destination(),
            LogDestination::Both(PathBuf::from("url2md.log"))
        );
    }

    #[test]
    fn log_file_takes_an_optional_path() {
        let cli = parse(&["--log-file=run.log", "https://example.com/"]);
        assert_eq!(cli.log_destination(), LogDestination::Both(PathBuf::from("run.log")));
    }

    #[test]
    fn filter_path_needs_sitemap_mode() {
        let without = Cli::try_parse_from(["url2md", "--filter-path", "/blog/", "https://e.com/s.xml"]);
        assert!(without.is_err());
        let with = parse(&["-s", "--filter-path", "/blog/", "https://e.com/s.xml"]);
        assert_eq!(with.filter_path.as_deref(), Some("/blog/"));
    }

    #[test]
    fn unknown_filename_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["url2md", "--filename", "hash", "https://e.com/"]).is_err());
    }
}
