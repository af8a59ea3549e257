use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;
use url2md_core::FilenameStrategy;

use crate::fetch::FetchSettings;

pub const DEFAULT_OUTPUT_DIR: &str = "output";
const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Produces the `created` frontmatter value.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub output_dir: PathBuf,
    pub fetch: FetchSettings,
    pub filename_strategy: FilenameStrategy,
    pub created_at: Clock,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fetch: FetchSettings::default(),
            filename_strategy: FilenameStrategy::default(),
            created_at: Arc::new(|| chrono::Local::now().format(CREATED_FORMAT).to_string()),
        }
    }

    /// Fixed `created` value, for reproducible output.
    pub fn with_fixed_clock(mut self, created: impl Into<String>) -> Self {
        let created = created.into();
        self.created_at = Arc::new(move || created.clone());
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::default_with_output(DEFAULT_OUTPUT_DIR)
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("output_dir", &self.output_dir)
            .field("fetch", &self.fetch)
            .field("filename_strategy", &self.filename_strategy)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// 0 means unlimited.
    pub max_depth: usize,
    /// 0 means unlimited.
    pub max_urls: usize,
    pub delay: Duration,
    pub continue_on_error: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            max_urls: 0,
            delay: Duration::from_secs(1),
            continue_on_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("no URL to process")]
    NoUrls,
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid delay {0}: must be a non-negative number of seconds")]
    InvalidDelay(f64),
}

/// Parses a seed URL, accepting only absolute http(s) URLs with a host.
pub fn parse_seed_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

pub fn delay_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::InvalidDelay(secs));
    }
    Ok(Duration::from_secs_f64(secs))
}
