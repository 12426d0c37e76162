//! GitHub REST helpers for backlog sweeps.
//!
//! This module owns remote-specific concerns: repository references,
//! paginated issue listing and reporting failed conversions back to their
//! issues. Payload parsing stays in `crate::ir::io_event_json`.

use std::time::Duration;

use serde_json::json;

use crate::error::Issue2HugoError;
use crate::ir::io_event_json::GithubIssue;
use crate::ir::{IssueEvent, IssueNumber};

const API_ROOT: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
/// Upper bound on pages fetched in one sweep.
const MAX_PAGES: usize = 100;

/// Label added to an issue whose conversion failed.
pub const FAILURE_LABEL: &str = "conversion-error";
const FAILURE_LABEL_COLOR: &str = "ff0000";

/// GitHub rejects comment bodies above 65536 characters.
const MAX_COMMENT_CHARS: usize = 65_000;

/// Canonical `owner/name` reference to a repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parses `owner/name` or a `https://github.com/owner/name` URL.
    pub fn parse(input: &str) -> Result<Self, Issue2HugoError> {
        let invalid = || Issue2HugoError::InvalidConfig(format!(
            "expected repository as 'owner/name' or a github.com URL, got '{input}'"
        ));

        let path = if input.starts_with("http://") || input.starts_with("https://") {
            let url = url::Url::parse(input).map_err(|_| invalid())?;
            if url.host_str() != Some("github.com") {
                return Err(invalid());
            }
            url.path().trim_matches('/').trim_end_matches(".git").to_string()
        } else {
            input.trim().to_string()
        };

        let mut parts = path.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if is_valid_segment(owner) && is_valid_segment(name) => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Lists the open issues of a repository, oldest first, pull requests included.
///
/// The pipeline gate drops pull requests, so callers see the same records the
/// REST API returns.
pub fn list_open_issues(
    repo: &RepoRef,
    token: Option<&str>,
) -> Result<Vec<IssueEvent>, Issue2HugoError> {
    let agent = agent();
    let api_err = |message: String| Issue2HugoError::GithubApi {
        repo: repo.full_name(),
        message,
    };

    let mut issues = Vec::new();
    for page in 1..=MAX_PAGES {
        let mut url = url::Url::parse(&format!(
            "{API_ROOT}/repos/{}/{}/issues",
            repo.owner, repo.name
        ))
        .map_err(|source| api_err(source.to_string()))?;
        url.query_pairs_mut()
            .append_pair("state", "open")
            .append_pair("sort", "created")
            .append_pair("direction", "asc")
            .append_pair("per_page", &PER_PAGE.to_string())
            .append_pair("page", &page.to_string());

        let mut response = with_headers(agent.get(url.as_str()), token)
            .call().map_err(|source| api_err(source.to_string()))?;
        let batch: Vec<GithubIssue> = response
            .body_mut()
            .read_json()
            .map_err(|source| api_err(source.to_string()))?;

        let len = batch.len();
        tracing::debug!(repo = %repo.full_name(), page, count = len, "fetched issue page");
        issues.extend(batch.into_iter().map(IssueEvent::from));
        if len < PER_PAGE {
            return Ok(issues);
        }
    }

    tracing::warn!(repo = %repo.full_name(), pages = MAX_PAGES, "stopped listing at page limit");
    Ok(issues)
}

/// Comments the error on a failed issue and labels it [`FAILURE_LABEL`].
///
/// The label is created first when the repository does not have it yet.
pub fn report_failure(
    repo: &RepoRef,
    token: &str,
    issue: IssueNumber,
    error: &str,
) -> Result<(), Issue2HugoError> {
    let agent = agent();
    let api_err = |message: String| Issue2HugoError::GithubApi {
        repo: repo.full_name(),
        message,
    };
    let repo_url = format!("{API_ROOT}/repos/{}/{}", repo.owner, repo.name);

    with_headers(agent.post(&format!("{repo_url}/issues/{issue}/comments")), Some(token))
        .send_json(json!({ "body": failure_comment(error) }))
        .map_err(|source| api_err(format!("commenting on #{issue}: {source}")))?;

    let created = with_headers(agent.post(&format!("{repo_url}/labels")), Some(token))
        .send_json(json!({ "name": FAILURE_LABEL, "color": FAILURE_LABEL_COLOR }));
    match created {
        Ok(_) => tracing::info!(repo = %repo.full_name(), label = FAILURE_LABEL, "created label"),
        // 422: the label already exists.
        Err(ureq::Error::StatusCode(422)) => {}
        Err(source) => return Err(api_err(format!("creating label: {source}"))),
    }

    with_headers(agent.post(&format!("{repo_url}/issues/{issue}/labels")), Some(token))
        .send_json(json!({ "labels": [FAILURE_LABEL] }))
        .map_err(|source| api_err(format!("labeling #{issue}: {source}")))?;

    tracing::info!(repo = %repo.full_name(), %issue, "reported conversion failure");
    Ok(())
}

/// Body of the comment left on an issue that failed to convert.
pub fn failure_comment(error: &str) -> String {
    let comment = format!("Conversion failed, please check the issue format:\n\n```\n{error}\n```");
    if comment.chars().count() <= MAX_COMMENT_CHARS {
        return comment;
    }
    let mut truncated: String = comment.chars().take(MAX_COMMENT_CHARS).collect();
    truncated.push_str("\n```\n...(truncated)");
    truncated
}

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(30)))
        .build()
        .into()
}

fn with_headers<B>(request: ureq::RequestBuilder<B>, token: Option<&str>) -> ureq::RequestBuilder<B> {
    let request = request
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", concat!("issue2hugo/", env!("CARGO_PKG_VERSION")));
    match token {
        Some(token) => request.header("Authorization", &format!("Bearer {token}")),
        None => request,
    }
}
