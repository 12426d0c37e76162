//! issue2hugo: publish GitHub issues as Hugo content bundles.
//!
//! An issue labeled for publication becomes
//! `content/posts/<YYYYMMDD>_<number>/index.md`, with its remote images
//! downloaded next to it, the first one promoted to cover, and a category
//! and tags read from a trailing `$tag$` line. The bundle is written only
//! when it differs from what is already on disk, so repeated runs on an
//! unchanged issue produce no commits.
//!
//! # Modules
//!
//! - [`ir`]: Content model (IssueEvent, ContentRecord, OutputBundle) and bundle I/O
//! - [`tags`]: Tag line and category extraction
//! - [`images`]: Image discovery, download and localization
//! - [`frontmatter`]: Hugo front matter
//! - [`assemble`]: Document rendering and bundle layout
//! - [`diff`]: Change detection against disk
//! - [`conversion`]: The pipeline and its report
//! - [`config`]: Run configuration
//! - [`error`]: Error types for issue2hugo operations

pub mod assemble;
pub mod config;
pub mod conversion;
pub mod diff;
pub mod error;
pub mod frontmatter;
pub mod github;
pub mod images;
pub mod ir;
pub mod markdown;
pub mod tags;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

pub use error::Issue2HugoError;

use config::{Config, ConfigOverrides};
use conversion::{Pipeline, WriteMode};
use frontmatter::DateFormat;
use images::HttpFetcher;

/// The issue2hugo CLI application.
#[derive(Parser)]
#[command(name = "issue2hugo")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence when set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert the issue(s) in a GitHub event payload.
    Convert(ConvertArgs),
    /// Convert every open issue of a repository or an exported issue list.
    Sweep(SweepArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Event payload or issue JSON file.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

/// Where a sweep reads its issues from.
#[derive(clap::Args)]
#[group(required = true, multiple = false, id = "source")]
struct SweepSource {
    /// Repository to list open issues from ('owner/name').
    #[arg(long)]
    repo: Option<String>,

    /// JSON file holding an array of issues.
    #[arg(long)]
    input: Option<PathBuf>,
}

/// Arguments for the sweep subcommand.
#[derive(clap::Args)]
struct SweepArgs {
    #[command(flatten)]
    source: SweepSource,

    /// Comment on each failed issue and label it 'conversion-error'.
    #[arg(long, requires = "repo")]
    report_failures: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// Options shared by convert and sweep.
#[derive(clap::Args)]
struct CommonArgs {
    /// YAML config file.
    #[arg(long, env = "ISSUE2HUGO_CONFIG")]
    config: Option<PathBuf>,

    /// Output root directory [default: content/posts].
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Ordered, comma-separated category names.
    #[arg(long, env = "CATEGORY_MAP")]
    categories: Option<String>,

    /// Label that marks an issue for publication [default: publish].
    #[arg(long, env = "PUBLISH_LABEL")]
    publish_label: Option<String>,

    /// Login whose issues are ignored [default: github-actions[bot]].
    #[arg(long, env = "BOT_LOGIN")]
    bot_login: Option<String>,

    /// How the front matter date is written [default: day].
    #[arg(long, env = "DATE_FORMAT", value_enum)]
    date_format: Option<DateFormatArg>,

    /// Category used when neither tags nor labels name one.
    #[arg(long, env = "DEFAULT_CATEGORY")]
    default_category: Option<String>,

    /// GitHub token, sent only to GitHub hosts.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Decide what would change without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DateFormatArg {
    Day,
    Timestamp,
}

impl From<DateFormatArg> for DateFormat {
    fn from(arg: DateFormatArg) -> Self {
        match arg {
            DateFormatArg::Day => DateFormat::Day,
            DateFormatArg::Timestamp => DateFormat::Timestamp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

impl CommonArgs {
    fn load_config(&self) -> Result<Config, Issue2HugoError> {
        Config::load(
            self.config.as_deref(),
            ConfigOverrides {
                categories: self.categories.clone(),
                publish_label: self.publish_label.clone(),
                bot_login: self.bot_login.clone(),
                output_root: self.output.clone(),
                date_format: self.date_format.map(DateFormat::from),
                default_category: self.default_category.clone(),
            },
        )
    }

    fn write_mode(&self) -> WriteMode {
        if self.dry_run {
            WriteMode::DryRun
        } else {
            WriteMode::Persist
        }
    }
}

/// Run the issue2hugo CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), Issue2HugoError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Sweep(args)) => run_sweep(args),
        None => {
            println!("issue2hugo {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Publish GitHub issues as Hugo content bundles.");
            println!();
            println!("Run 'issue2hugo --help' for usage information.");
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries only the report.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), Issue2HugoError> {
    let config = args.common.load_config()?;
    let events = ir::io_event_json::read_issue_events(&args.event)?;
    let fetcher = HttpFetcher::new(args.common.token.clone());
    let pipeline = Pipeline::new(&config, &fetcher);

    if let [issue] = events.as_slice() {
        let outcome = pipeline.convert(issue, args.common.write_mode())?;
        print_report(args.common.report, &outcome)?;
        emit_changed(outcome.changed())
    } else {
        sweep_and_report(&pipeline, &events, &args.common)
    }
}

/// Execute the sweep subcommand.
fn run_sweep(args: SweepArgs) -> Result<(), Issue2HugoError> {
    let config = args.common.load_config()?;
    let repo = args.source.repo.as_deref().map(github::RepoRef::parse).transpose()?;
    let report_to = match (args.report_failures, &repo) {
        (false, _) => None,
        (true, Some(repo)) => {
            let token = args.common.token.as_deref().ok_or_else(|| {
                Issue2HugoError::InvalidConfig(
                    "--report-failures needs a GitHub token (--token or GITHUB_TOKEN)".to_string(),
                )
            })?;
            Some((repo, token))
        }
        (true, None) => {
            return Err(Issue2HugoError::InvalidConfig(
                "--report-failures needs --repo".to_string(),
            ))
        }
    };

    let events = match (&repo, &args.source.input) {
        (Some(repo), _) => {
            tracing::info!(repo = %repo.full_name(), "listing open issues");
            github::list_open_issues(repo, args.common.token.as_deref())?
        }
        (None, Some(input)) => ir::io_event_json::read_issue_events(input)?,
        (None, None) => {
            return Err(Issue2HugoError::InvalidConfig(
                "sweep needs --repo or --input".to_string(),
            ))
        }
    };

    let fetcher = HttpFetcher::new(args.common.token.clone());
    let pipeline = Pipeline::new(&config, &fetcher);
    let summary = sweep(&pipeline, &events, &args.common)?;

    if let Some((repo, token)) = report_to {
        if args.common.dry_run {
            tracing::info!(failed = summary.failed.len(), "dry run; not reporting failures");
        } else {
            report_failures(repo, token, &summary.failed);
        }
    }
    sweep_result(&summary)
}

/// Reporting is best effort: a failed API call is logged and the rest go on.
fn report_failures(repo: &github::RepoRef, token: &str, failures: &[conversion::SweepFailure]) {
    for failure in failures {
        if let Err(err) = github::report_failure(repo, token, failure.issue, &failure.error) {
            tracing::warn!(issue = %failure.issue, error = %err, "could not report failure");
        }
    }
}

fn sweep_and_report(
    pipeline: &Pipeline<'_>,
    events: &[ir::IssueEvent],
    common: &CommonArgs,
) -> Result<(), Issue2HugoError> {
    let summary = sweep(pipeline, events, common)?;
    sweep_result(&summary)
}

fn sweep(
    pipeline: &Pipeline<'_>,
    events: &[ir::IssueEvent],
    common: &CommonArgs,
) -> Result<conversion::SweepSummary, Issue2HugoError> {
    tracing::info!(count = events.len(), "sweeping issues");
    let summary = pipeline.sweep(events, common.write_mode());
    print_report(common.report, &summary)?;
    emit_changed(summary.any_changed())?;
    Ok(summary)
}

fn sweep_result(summary: &conversion::SweepSummary) -> Result<(), Issue2HugoError> {
    if summary.failed.is_empty() {
        Ok(())
    } else {
        Err(Issue2HugoError::SweepFailed {
            failed: summary.failed.len(),
        })
    }
}

fn print_report<T>(format: ReportFormat, report: &T) -> Result<(), Issue2HugoError>
where
    T: serde::Serialize + std::fmt::Display,
{
    match format {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|source| Issue2HugoError::Io(source.into()))?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{report}"),
    }
    Ok(())
}

/// Publishes the write decision as a step output when running in Actions.
fn emit_changed(changed: bool) -> Result<(), Issue2HugoError> {
    let Some(path) = std::env::var_os("GITHUB_OUTPUT") else {
        return Ok(());
    };
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "changed={changed}")?;
    Ok(())
}
