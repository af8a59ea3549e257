//! HTTP retrieval of pages and sitemaps.
//!
//! Every request gets its own client so the redirect policy can count hops for
//! that request alone. Bodies are streamed into a buffer capped at
//! [`FetchSettings::max_bytes`].

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use engine_logging::{engine_debug, engine_trace};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Response};

use crate::decode::DecodePolicy;
use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

pub const DEFAULT_USER_AGENT: &str = concat!("url2md/", env!("CARGO_PKG_VERSION"));

const PAGE_TYPES: [&str; 2] = ["text/html", "application/xhtml+xml"];
const SITEMAP_TYPES: [&str; 2] = ["application/xml", "text/xml"];

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Redirects followed before the request fails.
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Media types accepted from the Content-Type header. A missing header is accepted.
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
    pub decode: DecodePolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: PAGE_TYPES
                .iter()
                .chain(SITEMAP_TYPES.iter())
                .map(|media| media.to_string())
                .collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            decode: DecodePolicy::default(),
        }
    }
}

impl FetchSettings {
    fn accepts(&self, content_type: &str) -> bool {
        let media = media_type(content_type);
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media))
    }
}

/// `text/html; charset=utf-8` -> `text/html`
fn media_type(content_type: &str) -> &str {
    content_type
        .split_once(';')
        .map_or(content_type, |(media, _)| media)
        .trim()
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn client(&self, hops: Arc<AtomicUsize>) -> Result<reqwest::Client, FetchError> {
        let limit = self.settings.redirect_limit;
        let policy = redirect::Policy::custom(move |attempt| {
            // `previous` holds every URL requested so far, the original one included.
            let followed = attempt.previous().len();
            hops.store(followed, Ordering::Relaxed);
            if followed > limit {
                attempt.error(format!("more than {limit} redirects"))
            } else {
                attempt.follow()
            }
        });

        reqwest::Client::builder()
            .user_agent(self.settings.user_agent.as_str())
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(policy)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }

    /// Rejects the response on its status line and headers, before any body is read.
    /// Returns the Content-Type header when it is present.
    fn screen(&self, response: &Response) -> Result<Option<String>, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(declared) = response.content_length() {
            if declared > self.settings.max_bytes {
                return Err(self.too_large(declared));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        match content_type {
            Some(ct) if !self.settings.accepts(&ct) => Err(FetchError::new(
                FailureKind::UnsupportedContentType { content_type: ct },
                "unsupported content type",
            )),
            other => Ok(other),
        }
    }

    /// Streams the body, failing as soon as it grows past the size cap.
    async fn read_body(&self, response: Response) -> Result<Vec<u8>, FetchError> {
        let capacity = response
            .content_length()
            .unwrap_or_default()
            .min(self.settings.max_bytes);
        let mut body = Vec::with_capacity(capacity as usize);
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(classify)?;
            let received = (body.len() + chunk.len()) as u64;
            if received > self.settings.max_bytes {
                return Err(self.too_large(received));
            }
            body.extend_from_slice(&chunk);
            engine_trace!("{} bytes received", received);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let target = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let hops = Arc::new(AtomicUsize::new(0));
        let response = self
            .client(Arc::clone(&hops))?
            .get(target)
            .send()
            .await
            .map_err(classify)?;

        let content_type = self.screen(&response)?;
        let final_url = response.url().to_string();
        let bytes = self.read_body(response).await?;

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            redirect_count: hops.load(Ordering::Relaxed),
            content_type,
            byte_len: bytes.len() as u64,
        };
        engine_debug!(
            "Fetched {} ({} bytes, {} redirects)",
            metadata.final_url,
            metadata.byte_len,
            metadata.redirect_count
        );
        Ok(FetchOutput { bytes, metadata })
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::RedirectLimitExceeded
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, err.to_string())
}
