//! workscribe - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use workscribe::dates::{custom_range, last_week_range, this_week_range, today_range};
use workscribe::output::write_markdown;
use workscribe::report::{
    ChangeSpan, GenerationMode, produce_change_summary, produce_commit_message, produce_report,
    resolve_provider,
};
use workscribe::vcs::GitProvider;
use workscribe::{
    DateRange, DiffScope, ReportError, ReportKind, ReportQuery, Settings, SettingsOverrides,
    VcsProvider,
};

/// Commits summarized by `change-summary` when no span is given.
const DEFAULT_RECENT_SPAN: usize = 5;

/// Generate work reports and commit messages from Git/SVN history.
#[derive(Parser, Debug)]
#[command(name = "workscribe")]
#[command(about = "Generate work reports and commit messages from Git/SVN history")]
#[command(version)]
struct Cli {
    /// Repository root to read history from
    #[arg(short = 'C', long = "repo", default_value = ".", global = true)]
    repo: PathBuf,

    /// Config file (defaults to <repo>/.workscribe.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// AI provider: openai, anthropic, or deepseek
    #[arg(long, global = true)]
    provider: Option<String>,

    /// API key for the AI provider
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model name (defaults per provider)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Directory reports are written to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Only include commits whose author name or email contains this text
    #[arg(long, global = true)]
    author: Option<String>,

    /// VCS type: auto, git, or svn
    #[arg(long, global = true)]
    vcs: Option<String>,

    /// Report language: zh-CN or en
    #[arg(long, global = true)]
    language: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report for today
    Daily {
        #[command(flatten)]
        opts: ReportOpts,
    },
    /// Report for this week (Monday to Sunday)
    Weekly {
        /// Report on last week instead
        #[arg(long)]
        last: bool,

        #[command(flatten)]
        opts: ReportOpts,
    },
    /// Report for an explicit date range
    Custom {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: String,

        /// Last day, YYYY-MM-DD (defaults to --from)
        #[arg(long)]
        to: Option<String>,

        #[command(flatten)]
        opts: ReportOpts,
    },
    /// Draft a commit message for pending Git changes
    CommitMessage {
        /// Which changes to describe: staged, unstaged, or all
        #[arg(long, default_value = "staged")]
        scope: DiffScope,
    },
    /// Summarize recent Git changes for review
    ChangeSummary {
        /// Summarize the last N commits
        #[arg(long, conflicts_with_all = ["from", "to"])]
        recent: Option<usize>,

        /// One end of a commit range (from `workscribe log`)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Other end of the commit range
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Print instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// List recent Git commits
    Log {
        /// Number of commits to show
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct ReportOpts {
    /// Skip the AI backend and produce a plain digest
    #[arg(long)]
    no_ai: bool,

    /// Print the report instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Only include commits by the current VCS user
    #[arg(long)]
    mine: bool,

    /// Include diff bodies in the AI prompt
    #[arg(long)]
    diff: bool,
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            ai_provider: self.provider.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            output_directory: self.output_dir.clone(),
            author_filter: self.author.clone(),
            vcs: self.vcs.clone(),
            language: self.language.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if let Err(err) = run(cli).await {
        // Nothing-to-do outcomes are warnings, not failures
        match err.downcast_ref::<ReportError>() {
            Some(e) if e.is_empty_result() || matches!(e, ReportError::NoProviderDetected(_)) => {
                eprintln!("Warning: {}", e);
            }
            _ => return Err(err),
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let crate_level = if verbose { "workscribe=debug" } else { "workscribe=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(crate_level.parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let workspace = cli.repo.clone();
    let mut settings = Settings::load(&workspace, cli.config.as_deref())
        .context("Failed to load configuration")?;
    settings
        .apply(cli.overrides())
        .context("Invalid command-line option")?;

    let now = Local::now();
    match cli.command {
        Command::Daily { opts } => {
            run_report(&settings, &workspace, ReportKind::Daily, today_range(now), opts).await
        }
        Command::Weekly { last, opts } => {
            let range = if last {
                last_week_range(now)
            } else {
                this_week_range(now)
            };
            run_report(&settings, &workspace, ReportKind::Weekly, range, opts).await
        }
        Command::Custom { from, to, opts } => {
            let range = custom_range(&from, to.as_deref().unwrap_or(&from))?;
            run_report(&settings, &workspace, ReportKind::Custom, range, opts).await
        }
        Command::CommitMessage { scope } => {
            let message = produce_commit_message(&settings, &workspace, scope)
                .await
                .context("Failed to generate commit message")?;
            println!("{}", message);
            Ok(())
        }
        Command::ChangeSummary {
            recent,
            from,
            to,
            stdout,
        } => {
            let span = match (recent, from, to) {
                (_, Some(from), Some(to)) => ChangeSpan::Between { from, to },
                (recent, _, _) => ChangeSpan::Recent(recent.unwrap_or(DEFAULT_RECENT_SPAN)),
            };
            let summary = produce_change_summary(&settings, &workspace, span)
                .await
                .context("Failed to generate change summary")?;

            if stdout {
                println!("{}", summary.content);
            } else {
                let dir = settings.resolve_output_dir(&workspace);
                let path = write_markdown(&dir, &summary.file_stem, &summary.content)
                    .with_context(|| format!("Failed to write change summary to {}", dir.display()))?;
                println!("✓ Change summary written to {}", path.display());
            }
            Ok(())
        }
        Command::Log { count } => {
            let commits = GitProvider::new()
                .recent_commits(&workspace, count)
                .context("Failed to list commits")?;
            for commit in commits {
                println!("{}  {}  {}", commit.id, commit.date, commit.message);
            }
            Ok(())
        }
    }
}

async fn run_report(
    settings: &Settings,
    workspace: &Path,
    kind: ReportKind,
    range: DateRange,
    opts: ReportOpts,
) -> Result<()> {
    let mut query = ReportQuery::new(kind, range).with_diff(opts.diff);

    if opts.mine {
        let provider = resolve_provider(settings, workspace)?;
        match provider.current_user(workspace).await {
            Some(user) => {
                info!("Filtering commits by current user {}", user);
                query = query.with_author(user);
            }
            None => warn!("Could not determine the current VCS user; not filtering by author"),
        }
    }

    let mode = if opts.no_ai {
        GenerationMode::Fallback
    } else {
        if !settings.has_api_key() {
            info!("No API key configured, generating a plain report without AI");
        }
        GenerationMode::Auto
    };

    let report = produce_report(settings, workspace, query, mode)
        .await
        .context("Failed to generate report")?;

    if opts.stdout {
        println!("{}", report.content);
        return Ok(());
    }

    let dir = settings.resolve_output_dir(workspace);
    let path = write_markdown(&dir, &report.file_stem, &report.content)
        .with_context(|| format!("Failed to write report to {}", dir.display()))?;
    println!(
        "✓ {} report written to {} ({} commits{})",
        kind,
        path.display(),
        report.commit_count,
        if report.used_ai { "" } else { ", no AI" }
    );
    Ok(())
}
