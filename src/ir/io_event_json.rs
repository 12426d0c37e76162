//! GitHub issue payload reader.
//!
//! Accepts the three shapes the pipeline meets in practice:
//! - a webhook event payload (`{"action": ..., "issue": {...}}`)
//! - a bare issue object as returned by the REST API
//! - a JSON array of issue objects (a backlog export)
//!
//! Only the fields the pipeline uses are read; everything else is ignored.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::ids::IssueNumber;
use super::model::{IssueEvent, IssueState};
use crate::error::Issue2HugoError;

// ============================================================================
// GitHub Schema Types (internal to this module)
// ============================================================================

/// Issue object as serialized by the GitHub REST API and webhooks.
#[derive(Debug, Deserialize)]
pub struct GithubIssue {
    number: u64,

    #[serde(default)]
    title: String,

    /// `null` when the issue has no description.
    #[serde(default)]
    body: Option<String>,

    user: GithubUser,

    #[serde(default)]
    labels: Vec<GithubLabel>,

    created_at: DateTime<Utc>,

    #[serde(default)]
    state: IssueState,

    /// Present (with any content) only on pull requests.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
}

/// Labels arrive as objects from the API; some exports flatten them to names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GithubLabel {
    Object { name: String },
    Name(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Event { issue: GithubIssue },
    Issue(GithubIssue),
    Many(Vec<GithubIssue>),
}

impl From<GithubIssue> for IssueEvent {
    fn from(raw: GithubIssue) -> Self {
        IssueEvent {
            number: IssueNumber(raw.number),
            title: raw.title,
            body: raw.body.unwrap_or_default(),
            author: raw.user.login,
            labels: raw
                .labels
                .into_iter()
                .map(|label| match label {
                    GithubLabel::Object { name } | GithubLabel::Name(name) => name,
                })
                .collect(),
            created_at: raw.created_at,
            state: raw.state,
            is_pull_request: raw.pull_request.is_some_and(|v| !v.is_null()),
        }
    }
}

/// Reads every issue contained in a payload file.
///
/// # Errors
/// Returns an error if the file cannot be read or matches none of the
/// supported shapes.
pub fn read_issue_events(path: &Path) -> Result<Vec<IssueEvent>, Issue2HugoError> {
    let file = File::open(path).map_err(Issue2HugoError::Io)?;
    let reader = BufReader::new(file);

    let payload: Payload =
        serde_json::from_reader(reader).map_err(|source| Issue2HugoError::EventParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(payload_into_events(payload))
}

/// Reads issues from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_event_str(json: &str) -> Result<Vec<IssueEvent>, serde_json::Error> {
    serde_json::from_str::<Payload>(json).map(payload_into_events)
}

/// Reads issues from raw bytes without requiring UTF-8 upfront.
pub fn from_event_slice(bytes: &[u8]) -> Result<Vec<IssueEvent>, serde_json::Error> {
    serde_json::from_slice::<Payload>(bytes).map(payload_into_events)
}

fn payload_into_events(payload: Payload) -> Vec<IssueEvent> {
    match payload {
        Payload::Event { issue } | Payload::Issue(issue) => vec![issue.into()],
        Payload::Many(issues) => issues.into_iter().map(IssueEvent::from).collect(),
    }
}
