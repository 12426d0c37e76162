//! Core content model for issue2hugo.
//!
//! An [`IssueEvent`] goes in, a [`ContentRecord`] is the canonical parsed
//! result, and an [`OutputBundle`] is what lands on disk. All derived paths
//! are pure functions of the issue number and creation date.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ids::IssueNumber;

/// File name of the rendered document inside a bundle directory.
pub const INDEX_FILE: &str = "index.md";

/// Prefix shared by every image file the resolver names.
pub const IMAGE_PREFIX: &str = "image-";

/// Open/closed state of an issue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

/// An issue as delivered by GitHub. Never mutated once read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IssueEvent {
    pub number: IssueNumber,
    pub title: String,
    /// Markdown body; GitHub sends `null` for an empty body, which reads as "".
    pub body: String,
    /// Login of the issue author.
    pub author: String,
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub state: IssueState,
    /// Pull requests share the issue number space and the issues API.
    #[serde(default)]
    pub is_pull_request: bool,
}

impl IssueEvent {
    /// Creates an open, unlabeled issue.
    pub fn new(
        number: impl Into<IssueNumber>,
        title: impl Into<String>,
        body: impl Into<String>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            number: number.into(),
            title: title.into(),
            body: body.into(),
            author: author.into(),
            labels: Vec::new(),
            created_at,
            state: IssueState::Open,
            is_pull_request: false,
        }
    }

    /// Returns the issue with the given labels.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Directory name for this issue: `<YYYYMMDD>_<number>`.
    pub fn slug(&self) -> String {
        bundle_slug(self.number, &self.created_at)
    }
}

/// Derives the bundle slug from issue identity.
pub fn bundle_slug(number: IssueNumber, created_at: &DateTime<Utc>) -> String {
    format!("{}_{}", created_at.format("%Y%m%d"), number)
}

/// A markdown image reference found in an issue body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    /// URL or path as written in the body.
    pub url: String,
    pub alt: String,
    /// Order of appearance among the image references of the body (0-based).
    pub position: usize,
    /// Local filename once the remote image has been downloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
}

impl ImageReference {
    pub fn new(url: impl Into<String>, alt: impl Into<String>, position: usize) -> Self {
        Self {
            url: url.into(),
            alt: alt.into(),
            position,
            local_name: None,
        }
    }

    /// True once the image has a local file in the bundle.
    pub fn is_resolved(&self) -> bool {
        self.local_name.is_some()
    }
}

/// The canonical parsed result of one issue.
#[derive(Clone, Debug, Serialize)]
pub struct ContentRecord {
    pub number: IssueNumber,
    pub title: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    /// At most one category; the first match wins.
    pub category: Option<String>,
    /// Ordered by first appearance, no duplicates.
    pub tags: Vec<String>,
    /// The first resolved image, if any.
    pub cover: Option<ImageReference>,
    /// Body with image references rewritten and the tag line removed.
    pub body: String,
}

/// A fully rendered bundle, ready to compare against disk or persist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputBundle {
    /// `<output-root>/<slug>`.
    pub dir: PathBuf,
    /// Front matter, blank line, body.
    pub document: String,
    /// Downloaded image bytes keyed by local filename.
    pub images: BTreeMap<String, Vec<u8>>,
}

impl OutputBundle {
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }
}

/// What currently exists at a bundle directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExistingBundle {
    /// Raw bytes of `index.md`, if present. Not required to be UTF-8.
    pub document: Option<Vec<u8>>,
    /// Names of every other regular file in the directory.
    pub files: BTreeSet<String>,
}

impl ExistingBundle {
    /// Image files previously written by the resolver.
    pub fn image_files(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .map(String::as_str)
            .filter(|name| is_managed_image(name))
    }
}

/// `image-<seq>-<8 hex>.<ext>`, exactly what the resolver emits.
static MANAGED_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^image-[1-9][0-9]*-[0-9a-f]{8}\.[a-z0-9]+$").unwrap());

/// True when a file name follows the resolver's naming scheme. A user file
/// such as `image-diagram.png` is not managed and is never pruned.
pub fn is_managed_image(name: &str) -> bool {
    MANAGED_IMAGE.is_match(name)
}
