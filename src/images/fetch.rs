//! Remote image fetching.
//!
//! [`ImageFetcher`] is the only seam through which the pipeline touches the
//! network. [`HttpFetcher`] is the production implementation;
//! [`MemoryFetcher`] serves canned responses for offline runs and tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

/// Default cap on a single image download.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// Default global timeout for one image request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bytes and content type of a downloaded image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchedImage {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: Option<&str>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.map(str::to_string),
        }
    }
}

/// Why an image could not be fetched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("image exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("request failed: {0}")]
    Transport(String),
}

/// Downloads image bytes for a URL.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// Blocking HTTP fetcher backed by `ureq`.
pub struct HttpFetcher {
    agent: ureq::Agent,
    token: Option<String>,
    max_bytes: u64,
}

impl HttpFetcher {
    /// Creates a fetcher; `token` is sent only to GitHub-owned hosts.
    pub fn new(token: Option<String>) -> Self {
        Self::with_limits(token, DEFAULT_TIMEOUT, DEFAULT_MAX_IMAGE_BYTES)
    }

    pub fn with_limits(token: Option<String>, timeout: Duration, max_bytes: u64) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            token,
            max_bytes,
        }
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let mut request = self
            .agent
            .get(url)
            .header("User-Agent", concat!("issue2hugo/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = self.token.as_deref().filter(|_| is_github_host(url)) {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let mut response = request.call().map_err(|err| map_ureq_error(err, self.max_bytes))?;

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .map_err(|err| map_ureq_error(err, self.max_bytes))?;

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

fn map_ureq_error(err: ureq::Error, limit: u64) -> FetchError {
    match err {
        ureq::Error::StatusCode(code) => FetchError::Status(code),
        ureq::Error::BodyExceedsLimit(_) => FetchError::TooLarge { limit },
        other => FetchError::Transport(other.to_string()),
    }
}

/// True for hosts where a GitHub token is meaningful.
pub fn is_github_host(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    ["github.com", "githubusercontent.com"]
        .iter()
        .any(|root| host == *root || host.ends_with(&format!(".{root}")))
}

/// Serves images from memory and counts requests per URL.
///
/// URLs without an entry fail with HTTP 404.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    images: HashMap<String, FetchedImage>,
    requests: RefCell<HashMap<String, usize>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the response for `url`.
    pub fn with_image(mut self, url: impl Into<String>, image: FetchedImage) -> Self {
        self.images.insert(url.into(), image);
        self
    }

    /// Number of times `url` was requested.
    pub fn requests(&self, url: &str) -> usize {
        self.requests.borrow().get(url).copied().unwrap_or(0)
    }
}

impl ImageFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        *self.requests.borrow_mut().entry(url.to_string()).or_default() += 1;
        self.images.get(url).cloned().ok_or(FetchError::Status(404))
    }
}
