//! Hugo front matter.
//!
//! Rendered as YAML between `---` fences. Field names follow Hugo's
//! conventions: the single category goes into the `categories` taxonomy and
//! the cover into `image`, which most themes read as the page thumbnail.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::ir::{ImageReference, IssueEvent, IssueNumber};

/// How the issue creation timestamp is written to `date`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// `2024-05-01`
    #[default]
    Day,
    /// `2024-05-01T08:30:00Z`
    Timestamp,
}

impl DateFormat {
    pub fn name(&self) -> &'static str {
        match self {
            DateFormat::Day => "day",
            DateFormat::Timestamp => "timestamp",
        }
    }
}

/// The metadata block of a page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    pub slug: String,

    /// The optional category as a one-element list, or empty. Hugo taxonomies
    /// are lists, so a bare `category:` string would not be indexed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Cover file name, relative to the bundle directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl FrontMatter {
    /// The single category, if any.
    pub fn category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Renders the YAML body (without the `---` fences).
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Title used when an issue has none.
pub fn fallback_title(number: IssueNumber) -> String {
    format!("issue-{number}")
}

/// False when the issue title is empty or whitespace.
pub fn has_usable_title(issue: &IssueEvent) -> bool {
    !issue.title.trim().is_empty()
}

/// The issue title verbatim, or the fallback.
pub fn title_for(issue: &IssueEvent) -> String {
    if has_usable_title(issue) {
        issue.title.clone()
    } else {
        fallback_title(issue.number)
    }
}

/// Builds the front matter for an issue and its extraction results.
pub fn build_front_matter(
    issue: &IssueEvent,
    category: Option<&str>,
    tags: &[String],
    cover: Option<&ImageReference>,
    date_format: DateFormat,
) -> FrontMatter {
    let date = match date_format {
        DateFormat::Day => issue.created_at.format("%Y-%m-%d").to_string(),
        DateFormat::Timestamp => issue.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    };

    FrontMatter {
        title: title_for(issue),
        date,
        slug: issue.slug(),
        categories: category.map(str::to_string).into_iter().collect(),
        tags: tags.to_vec(),
        image: cover.and_then(|c| c.local_name.clone()),
    }
}
