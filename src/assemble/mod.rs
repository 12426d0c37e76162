//! Content assembly: front matter + body into an [`OutputBundle`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Issue2HugoError;
use crate::frontmatter::FrontMatter;
use crate::ir::{bundle_slug, IssueNumber, OutputBundle};

/// Default output root, relative to the site checkout.
pub const DEFAULT_OUTPUT_ROOT: &str = "content/posts";

/// `<root>/<YYYYMMDD>_<number>`.
pub fn bundle_dir(root: &Path, number: IssueNumber, created_at: &DateTime<Utc>) -> PathBuf {
    root.join(bundle_slug(number, created_at))
}

/// Renders `---\n<yaml>---\n\n<body>\n`.
///
/// Trailing whitespace of the body is dropped so that cosmetic edits at the
/// end of an issue do not produce a new document.
pub fn render_document(front_matter: &FrontMatter, body: &str) -> Result<String, serde_yaml::Error> {
    let yaml = front_matter.to_yaml()?;
    let body = body.trim_end();

    let mut document = String::with_capacity(yaml.len() + body.len() + 16);
    document.push_str("---\n");
    document.push_str(&yaml);
    if !yaml.ends_with('\n') {
        document.push('\n');
    }
    document.push_str("---\n\n");
    if !body.is_empty() {
        document.push_str(body);
        document.push('\n');
    }
    Ok(document)
}

/// Builds the bundle for one issue.
pub fn assemble(
    root: &Path,
    number: IssueNumber,
    created_at: &DateTime<Utc>,
    front_matter: &FrontMatter,
    body: &str,
    images: BTreeMap<String, Vec<u8>>,
) -> Result<OutputBundle, Issue2HugoError> {
    Ok(OutputBundle {
        dir: bundle_dir(root, number, created_at),
        document: render_document(front_matter, body)?,
        images,
    })
}
