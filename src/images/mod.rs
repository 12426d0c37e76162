//! Image resolution: find, download and localize body images.
//!
//! Every `![alt](url)` and `<img src="url">` outside code is recorded as an
//! [`ImageReference`].
//! Relative paths are kept as they are. Remote `http(s)` images are fetched
//! once per distinct URL and stored as
//!
//! ```text
//! image-<n>-<sha256 prefix>.<ext>
//! ```
//!
//! where `n` counts resolved remote URLs in body order. The content hash
//! makes a replaced remote image show up as a new file name, so the change
//! detector notices it. Failed downloads keep their remote URL and are
//! reported; they never abort the run.

pub mod ext;
pub mod fetch;

pub use fetch::{FetchError, FetchedImage, HttpFetcher, ImageFetcher, MemoryFetcher};

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ir::{ImageReference, IMAGE_PREFIX};
use crate::markdown::CodeRegions;

/// `![alt](url "optional title")`
static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]\n]*)\]\(\s*([^\s()]+)((?:\s+"[^"\n]*")?)\s*\)"#).unwrap()
});

/// `<img ... src="url" ...>`, as GitHub emits for resized attachments.
static HTML_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());

static HTML_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\ssrc\s*=\s*(?:"([^"]+)"|'([^']+)')"#).unwrap()
});

static HTML_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\salt\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Hex digits of the content hash kept in file names.
const HASH_PREFIX_LEN: usize = 8;

/// A remote image that could not be downloaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub url: String,
    pub reason: String,
}

/// Output of [`ImageResolver::resolve`].
#[derive(Clone, Debug, Default)]
pub struct ResolvedImages {
    /// One entry per image occurrence, in body order.
    pub references: Vec<ImageReference>,
    /// Body with resolved images pointing at local files.
    pub body: String,
    /// Downloaded bytes keyed by local file name.
    pub images: BTreeMap<String, Vec<u8>>,
    /// One entry per distinct URL that failed.
    pub failures: Vec<FetchFailure>,
}

impl ResolvedImages {
    /// The first resolved image in body order.
    pub fn cover(&self) -> Option<&ImageReference> {
        self.references.iter().find(|r| r.is_resolved())
    }
}

/// Resolves the images of a body through an [`ImageFetcher`].
pub struct ImageResolver<'a> {
    fetcher: &'a dyn ImageFetcher,
}

impl<'a> ImageResolver<'a> {
    pub fn new(fetcher: &'a dyn ImageFetcher) -> Self {
        Self { fetcher }
    }

    pub fn resolve(&self, body: &str) -> ResolvedImages {
        let code = CodeRegions::scan(body);
        let mut resolved = ResolvedImages::default();
        // URL -> local name, `None` once a fetch has failed.
        let mut seen: HashMap<String, Option<String>> = HashMap::new();
        let mut out = String::with_capacity(body.len());
        let mut last = 0;

        for occurrence in scan_images(body) {
            if code.contains(occurrence.start) {
                continue;
            }
            let url = &body[occurrence.url.clone()];

            let mut reference =
                ImageReference::new(url, occurrence.alt, resolved.references.len());
            if is_remote(url) {
                let local = match seen.get(url) {
                    Some(local) => local.clone(),
                    None => {
                        let local = self.download(url, &mut resolved);
                        seen.insert(url.to_string(), local.clone());
                        local
                    }
                };
                reference.local_name = local;
            }

            // Only the URL is replaced; alt text, titles and attributes stay.
            if let Some(local) = &reference.local_name {
                out.push_str(&body[last..occurrence.url.start]);
                out.push_str(local);
                last = occurrence.url.end;
            }

            resolved.references.push(reference);
        }

        out.push_str(&body[last..]);
        resolved.body = out;
        resolved
    }

    fn download(&self, url: &str, resolved: &mut ResolvedImages) -> Option<String> {
        match self.fetcher.fetch(url) {
            Ok(image) => {
                let ext = ext::infer_extension(image.content_type.as_deref(), url, &image.bytes);
                let name = local_file_name(resolved.images.len() + 1, &image.bytes, ext);
                tracing::info!(url, file = %name, bytes = image.bytes.len(), "downloaded image");
                resolved.images.insert(name.clone(), image.bytes);
                Some(name)
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "image fetch failed; keeping remote URL");
                resolved.failures.push(FetchFailure {
                    url: url.to_string(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }
}

/// Builds `image-<seq>-<hash>.<ext>` for downloaded bytes.
pub fn local_file_name(seq: usize, bytes: &[u8], ext: &str) -> String {
    let digest = Sha256::digest(bytes);
    let hash: String = digest
        .iter()
        .take(HASH_PREFIX_LEN / 2)
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("{IMAGE_PREFIX}{seq}-{hash}.{ext}")
}

/// True for absolute `http`/`https` URLs.
pub fn is_remote(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Fuzz-only entrypoint: resolves a body against a fetcher that serves nothing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_resolve_body(body: &str) -> usize {
    let fetcher = MemoryFetcher::new();
    let resolved = ImageResolver::new(&fetcher).resolve(body);
    debug_assert_eq!(resolved.body, body);
    resolved.references.len()
}

/// One image occurrence, markdown or HTML.
struct Occurrence<'b> {
    start: usize,
    end: usize,
    url: Range<usize>,
    alt: &'b str,
}

/// Markdown and `<img>` occurrences in body order.
fn scan_images(body: &str) -> Vec<Occurrence<'_>> {
    let markdown = MARKDOWN_IMAGE.captures_iter(body).filter_map(|caps| {
        Some(Occurrence {
            start: caps.get(0)?.start(),
            end: caps.get(0)?.end(),
            url: caps.get(2)?.range(),
            alt: caps.get(1).map_or("", |m| m.as_str()),
        })
    });
    let html = HTML_IMAGE.find_iter(body).filter_map(|tag| {
        let src = HTML_SRC.captures(tag.as_str())?;
        let url = src.get(1).or_else(|| src.get(2))?;
        let alt = HTML_ALT
            .captures(tag.as_str())
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map_or("", |m| m.as_str());
        Some(Occurrence {
            start: tag.start(),
            end: tag.end(),
            url: tag.start() + url.start()..tag.start() + url.end(),
            alt,
        })
    });

    let mut found: Vec<Occurrence<'_>> = markdown.chain(html).collect();
    found.sort_by_key(|o| o.start);
    // A markdown image inside an `<img>` attribute (or the reverse) is not a second image.
    let mut end = 0;
    found.retain(|o| {
        let keep = o.start >= end;
        if keep {
            end = o.end;
        }
        keep
    });
    found
}
