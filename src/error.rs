use std::path::PathBuf;
use thiserror::Error;

/// The main error type for issue2hugo operations.
///
/// Only conditions that leave no durable output are errors. Recoverable
/// problems (failed image fetches, a missing title) are reported as issues
/// in a `ConversionReport` instead.
#[derive(Debug, Error)]
pub enum Issue2HugoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse issue payload from {path}: {source}")]
    EventParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to render front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("Failed to write bundle at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("GitHub API request for {repo} failed: {message}")]
    GithubApi { repo: String, message: String },

    #[error("Sweep finished with {failed} failed issue(s)")]
    SweepFailed { failed: usize },
}
