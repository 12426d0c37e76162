//! The issue-to-bundle pipeline.
//!
//! ```text
//! IssueEvent ─► gate ─► tags ─► images ─► front matter ─► assemble ─► diff ─► persist
//! ```
//!
//! Every step except the final write is free of side effects on disk, so a
//! dry run and a real run make the same decision.

pub mod report;

pub use report::{
    ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity, ImageCounts,
};

use std::fmt;

use serde::Serialize;

use crate::assemble;
use crate::config::Config;
use crate::diff::detect_changes;
use crate::error::Issue2HugoError;
use crate::frontmatter::{build_front_matter, has_usable_title, FrontMatter};
use crate::images::{is_remote, ImageFetcher, ImageResolver};
use crate::ir::io_hugo::{read_existing, write_bundle};
use crate::ir::{ContentRecord, IssueEvent, IssueNumber, IssueState, OutputBundle};
use crate::tags::TagExtractor;

/// Whether a changed bundle is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    #[default]
    Persist,
    DryRun,
}

/// Why an issue was not converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    PullRequest,
    /// Authored by the configured bot login.
    SelfTriggered,
    /// Missing the publish label.
    NotPublishable,
    NotOpen,
}

impl SkipReason {
    pub fn name(&self) -> &'static str {
        match self {
            SkipReason::PullRequest => "pull request",
            SkipReason::SelfTriggered => "authored by the bot itself",
            SkipReason::NotPublishable => "missing publish label",
            SkipReason::NotOpen => "issue is not open",
        }
    }
}

/// Result of running the pipeline on one issue.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Skipped {
        issue: IssueNumber,
        reason: SkipReason,
    },
    Converted(ConversionReport),
}

impl Outcome {
    /// True when the bundle changed (whether or not it was written).
    pub fn changed(&self) -> bool {
        matches!(self, Outcome::Converted(report) if report.change.changed)
    }

    pub fn report(&self) -> Option<&ConversionReport> {
        match self {
            Outcome::Converted(report) => Some(report),
            Outcome::Skipped { .. } => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Skipped { issue, reason } => writeln!(f, "#{} skipped: {}", issue, reason.name()),
            Outcome::Converted(report) => write!(f, "{report}"),
        }
    }
}

/// A converted issue before it is compared with disk.
#[derive(Clone, Debug)]
pub struct Prepared {
    pub record: ContentRecord,
    pub front_matter: FrontMatter,
    pub bundle: OutputBundle,
    pub images: ImageCounts,
    pub issues: Vec<ConversionIssue>,
}

/// Runs issues through the conversion pipeline.
pub struct Pipeline<'a> {
    config: &'a Config,
    tags: TagExtractor,
    resolver: ImageResolver<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, fetcher: &'a dyn ImageFetcher) -> Self {
        Self {
            config,
            tags: TagExtractor::new(config.categories.clone()),
            resolver: ImageResolver::new(fetcher),
        }
    }

    /// Returns why `issue` must not be converted, if anything.
    pub fn skip_reason(&self, issue: &IssueEvent) -> Option<SkipReason> {
        if issue.is_pull_request {
            Some(SkipReason::PullRequest)
        } else if issue.author == self.config.bot_login {
            Some(SkipReason::SelfTriggered)
        } else if !issue.has_label(&self.config.publish_label) {
            Some(SkipReason::NotPublishable)
        } else if issue.state != IssueState::Open {
            Some(SkipReason::NotOpen)
        } else {
            None
        }
    }

    /// Parses and renders an issue without looking at disk.
    pub fn prepare(&self, issue: &IssueEvent) -> Result<Prepared, Issue2HugoError> {
        let mut issues = Vec::new();

        let extraction = self.tags.extract(&issue.body);
        if extraction.tag_line_in_code {
            issues.push(ConversionIssue::info(
                ConversionIssueCode::TagLineInCodeBlock,
                "last line looks like tags but is inside a code block; kept as text",
            ));
        }

        let resolved = self.resolver.resolve(&extraction.body);
        for failure in &resolved.failures {
            issues.push(ConversionIssue::warning(
                ConversionIssueCode::ImageFetchFailed,
                format!(
                    "image {} could not be downloaded ({}); remote URL kept",
                    failure.url, failure.reason
                ),
            ));
        }

        let category = self.category_for(issue, extraction.category, &mut issues);

        if !has_usable_title(issue) {
            tracing::warn!(issue = %issue.number, "issue has no title; using fallback");
            issues.push(ConversionIssue::warning(
                ConversionIssueCode::TitleFallback,
                format!("issue has no title; using 'issue-{}'", issue.number),
            ));
        }

        let cover = resolved.cover().cloned();
        let front_matter = build_front_matter(
            issue,
            category.as_deref(),
            &extraction.tags,
            cover.as_ref(),
            self.config.date_format,
        );

        let images = ImageCounts {
            found: resolved.references.len(),
            downloaded: resolved.images.len(),
            local: resolved
                .references
                .iter()
                .filter(|r| !is_remote(&r.url))
                .count(),
            failed: resolved.failures.len(),
        };

        let bundle = assemble::assemble(
            &self.config.output_root,
            issue.number,
            &issue.created_at,
            &front_matter,
            &resolved.body,
            resolved.images,
        )?;

        let record = ContentRecord {
            number: issue.number,
            title: front_matter.title.clone(),
            slug: front_matter.slug.clone(),
            created_at: issue.created_at,
            category,
            tags: extraction.tags,
            cover,
            body: resolved.body,
        };

        Ok(Prepared {
            record,
            front_matter,
            bundle,
            images,
            issues,
        })
    }

    /// Converts one issue and, in [`WriteMode::Persist`], writes it if it changed.
    ///
    /// # Errors
    /// Only failures that leave no durable output are errors: reading the
    /// existing bundle, rendering, or writing.
    pub fn convert(&self, issue: &IssueEvent, mode: WriteMode) -> Result<Outcome, Issue2HugoError> {
        if let Some(reason) = self.skip_reason(issue) {
            tracing::debug!(issue = %issue.number, reason = reason.name(), "skipping issue");
            return Ok(Outcome::Skipped {
                issue: issue.number,
                reason,
            });
        }

        let prepared = self.prepare(issue)?;
        let existing = read_existing(&prepared.bundle.dir)?;
        let change = detect_changes(&prepared.bundle, existing.as_ref());

        let written = change.changed && mode == WriteMode::Persist;
        if written {
            let stats = write_bundle(&prepared.bundle, existing.as_ref())?;
            tracing::info!(
                issue = %issue.number,
                dir = %prepared.bundle.dir.display(),
                reason = change.reason.name(),
                images_written = stats.images_written,
                images_removed = stats.images_removed,
                "wrote bundle"
            );
        } else {
            tracing::info!(
                issue = %issue.number,
                reason = change.reason.name(),
                "no write"
            );
        }

        let Prepared {
            record,
            bundle,
            images,
            issues,
            ..
        } = prepared;

        Ok(Outcome::Converted(ConversionReport {
            issue: record.number,
            title: record.title,
            dir: bundle.dir,
            change,
            written,
            category: record.category,
            tags: record.tags,
            cover: record.cover.and_then(|c| c.local_name),
            images,
            issues,
        }))
    }

    /// Converts issues one after another; a failing issue does not stop the rest.
    pub fn sweep(&self, issues: &[IssueEvent], mode: WriteMode) -> SweepSummary {
        let mut summary = SweepSummary::default();
        for issue in issues {
            match self.convert(issue, mode) {
                Ok(outcome) => summary.record(outcome),
                Err(err) => {
                    tracing::error!(issue = %issue.number, error = %err, "conversion failed");
                    summary.failed.push(SweepFailure {
                        issue: issue.number,
                        error: err.to_string(),
                    });
                }
            }
        }
        summary
    }

    /// Tag category, else the first label in the vocabulary, else the default.
    fn category_for(
        &self,
        issue: &IssueEvent,
        from_tags: Option<String>,
        issues: &mut Vec<ConversionIssue>,
    ) -> Option<String> {
        if from_tags.is_some() {
            return from_tags;
        }
        if let Some(label) = self
            .tags
            .first_category(issue.labels.iter().map(String::as_str))
        {
            issues.push(ConversionIssue::info(
                ConversionIssueCode::CategoryFromLabel,
                format!("category '{label}' taken from issue label"),
            ));
            return Some(label);
        }
        let default = self.config.default_category.clone()?;
        issues.push(ConversionIssue::info(
            ConversionIssueCode::CategoryDefault,
            format!("no category named; using default '{default}'"),
        ));
        Some(default)
    }
}

/// An issue that failed during a sweep.
#[derive(Clone, Debug, Serialize)]
pub struct SweepFailure {
    pub issue: IssueNumber,
    pub error: String,
}

/// Aggregate result of a sweep.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SweepSummary {
    pub converted: usize,
    pub changed: usize,
    pub skipped: usize,
    pub failed: Vec<SweepFailure>,
    pub outcomes: Vec<Outcome>,
}

impl SweepSummary {
    fn record(&mut self, outcome: Outcome) {
        match &outcome {
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Converted(report) => {
                self.converted += 1;
                if report.change.changed {
                    self.changed += 1;
                }
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn any_changed(&self) -> bool {
        self.changed > 0
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            write!(f, "{outcome}")?;
        }
        writeln!(
            f,
            "Sweep: {} converted ({} changed), {} skipped, {} failed",
            self.converted,
            self.changed,
            self.skipped,
            self.failed.len()
        )?;
        for failure in &self.failed {
            writeln!(f, "  - #{}: {}", failure.issue, failure.error)?;
        }
        Ok(())
    }
}
