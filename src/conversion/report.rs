//! Conversion report types.
//!
//! Recovered problems (failed image downloads, a missing title) and policy
//! decisions (where the category came from) are collected here instead of
//! failing the run, similar to how `diff::ChangeReport` explains the write
//! decision.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::diff::ChangeReport;
use crate::ir::IssueNumber;

/// A report generated for one converted issue.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionReport {
    pub issue: IssueNumber,
    pub title: String,
    /// Bundle directory.
    pub dir: PathBuf,
    pub change: ChangeReport,
    /// True when the bundle was persisted during this run.
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub images: ImageCounts,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    /// Count of warning-level issues (recovered failures).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    /// Count of info-level issues (policy decisions, notes).
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    pub fn has(&self, code: ConversionIssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.written {
            "written"
        } else if self.change.changed {
            "not written"
        } else {
            "skipped write"
        };
        writeln!(
            f,
            "#{} -> {} ({}, {})",
            self.issue,
            self.dir.display(),
            self.change,
            action
        )?;
        writeln!(f, "  title: {}", self.title)?;
        writeln!(
            f,
            "  category: {}",
            self.category.as_deref().unwrap_or("(none)")
        )?;
        if self.tags.is_empty() {
            writeln!(f, "  tags: (none)")?;
        } else {
            writeln!(f, "  tags: {}", self.tags.join(", "))?;
        }
        if let Some(cover) = &self.cover {
            writeln!(f, "  cover: {cover}")?;
        }
        writeln!(
            f,
            "  {} image(s): {} downloaded, {} local, {} failed",
            self.images.found, self.images.downloaded, self.images.local, self.images.failed
        )?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Image occurrence counts for one body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImageCounts {
    /// Image references outside code.
    pub found: usize,
    /// Distinct remote URLs downloaded.
    pub downloaded: usize,
    /// References to relative paths, kept as written.
    pub local: usize,
    /// Distinct remote URLs that could not be downloaded.
    pub failed: usize,
}

/// A single issue noted during conversion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Create a warning-level issue (something was recovered from).
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue (policy note).
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// A remote image could not be downloaded; its URL was kept.
    ImageFetchFailed,
    /// The issue had no title; `issue-<number>` was used.
    TitleFallback,
    /// No tag named a category; an issue label did.
    CategoryFromLabel,
    /// Neither tags nor labels named a category; the configured default was used.
    CategoryDefault,
    /// The last line looked like tags but sits inside a code block.
    TagLineInCodeBlock,
}
