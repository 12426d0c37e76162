//! Tag and category extraction.
//!
//! The last non-blank line of an issue body may declare tags as a run of
//! `$token$` items:
//!
//! ```text
//! Some prose.
//!
//! $tech$ $rust$ $notes$
//! ```
//!
//! A line only counts when it holds nothing but such tokens and does not sit
//! inside a fenced code block. The line is then removed from the body. Tokens
//! that name an entry of the [`CategoryVocabulary`] also select the category;
//! the first one, left to right, wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::markdown::CodeRegions;

static TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\$[^$\n]*\$\s*)+$").unwrap());

static TAG_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$([^$\n]*)\$").unwrap());

/// The fixed, ordered list of category names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CategoryVocabulary(Vec<String>);

impl CategoryVocabulary {
    /// Builds a vocabulary, trimming names and dropping blanks and repeats.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
        Self(out)
    }

    /// Parses a comma-separated list, as used by `CATEGORY_MAP`.
    pub fn from_csv(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for CategoryVocabulary {
    fn from(names: Vec<String>) -> Self {
        Self::new(names)
    }
}

impl From<CategoryVocabulary> for Vec<String> {
    fn from(vocabulary: CategoryVocabulary) -> Self {
        vocabulary.0
    }
}

/// Result of scanning a body for its tag line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagExtraction {
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Body with line endings normalized and the tag line (if any) removed.
    pub body: String,
    /// The last line looked like tags but was inside a code block.
    pub tag_line_in_code: bool,
}

/// Extracts tags and a category using a fixed vocabulary.
#[derive(Clone, Debug)]
pub struct TagExtractor {
    vocabulary: CategoryVocabulary,
}

impl TagExtractor {
    pub fn new(vocabulary: CategoryVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    /// Splits the tag line off `body`.
    pub fn extract(&self, body: &str) -> TagExtraction {
        let normalized = body.replace("\r\n", "\n");
        let content = normalized.trim_end();
        let line_start = content.rfind('\n').map_or(0, |idx| idx + 1);
        let last_line = &content[line_start..];

        let Some(tokens) = parse_tag_line(last_line) else {
            return TagExtraction {
                body: normalized,
                ..Default::default()
            };
        };

        let token_pos = line_start + (last_line.len() - last_line.trim_start().len());
        if CodeRegions::scan(content).contains(token_pos) {
            tracing::debug!("tag line is inside a code block; leaving it as text");
            return TagExtraction {
                body: normalized,
                tag_line_in_code: true,
                ..Default::default()
            };
        }

        let mut tags: Vec<String> = Vec::new();
        for token in tokens {
            if !tags.iter().any(|t| t == token) {
                tags.push(token.to_string());
            }
        }
        let category = self.first_category(tags.iter().map(String::as_str));

        TagExtraction {
            category,
            tags,
            body: content[..line_start].trim_end().to_string(),
            tag_line_in_code: false,
        }
    }

    /// Returns the first name that is in the vocabulary.
    pub fn first_category<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Option<String> {
        names
            .into_iter()
            .find(|name| self.vocabulary.contains(name))
            .map(str::to_string)
    }
}

/// Returns the trimmed, non-empty tokens of a tag line, or `None` if the line
/// is not a tag line. A line of only empty pairs (`$$`, the closing fence of
/// display math) is not a tag line.
pub fn parse_tag_line(line: &str) -> Option<Vec<&str>> {
    if !TAG_LINE.is_match(line) {
        return None;
    }
    let tokens: Vec<&str> = TAG_TOKEN
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|token| !token.is_empty())
        .collect();
    (!tokens.is_empty()).then_some(tokens)
}
