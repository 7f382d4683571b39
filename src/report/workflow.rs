//! End-to-end workflows: period report, commit message, change summary.
//!
//! Each `produce_*` entry point builds its collaborators fresh from the given
//! [`Settings`]; the `*_with` variants accept them injected.

use std::path::Path;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::ai::{AiClient, Completer};
use crate::config::{Language, Settings};
use crate::error::{ConfigError, ReportError, VcsError};
use crate::prompt::{build_change_summary_prompt, build_commit_message_prompt};
use crate::vcs::{
    DiffScope, GitProvider, RecentCommit, ReportQuery, VcsKind, VcsProvider, VcsSelector,
    detect_provider, provider_for_kind,
};

use super::markdown::{change_summary_document, change_summary_file_stem};
use super::{GeneratedReport, ReportGenerator};

/// How many recent commits are searched when resolving a commit range.
pub const RANGE_PICKER_DEPTH: usize = 30;

/// Which report path to take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationMode {
    /// AI when an API key is configured, otherwise the fallback digest.
    #[default]
    Auto,
    /// Always the fallback digest.
    Fallback,
}

/// Span of history covered by a change summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSpan {
    /// The last N commits up to HEAD.
    Recent(usize),
    /// Two commits from the recent history, in either order.
    Between { from: String, to: String },
}

/// A finished change summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSummary {
    pub content: String,
    pub file_stem: String,
}

/// The provider selected by `settings.vcs` for `workspace`.
pub fn resolve_provider(
    settings: &Settings,
    workspace: &Path,
) -> Result<Box<dyn VcsProvider>, ReportError> {
    match settings.vcs {
        VcsSelector::Auto => detect_provider(workspace)
            .ok_or_else(|| ReportError::NoProviderDetected(workspace.display().to_string())),
        VcsSelector::Fixed(kind) => {
            let provider = provider_for_kind(kind);
            if !provider.is_repository(workspace) {
                return Err(not_a_repository(kind, workspace).into());
            }
            Ok(provider)
        }
    }
}

/// Fetch commits for `query` and render a report.
///
/// The AI path runs when `mode` is [`GenerationMode::Auto`] and an API key is
/// configured; otherwise the fallback digest is produced without network access.
pub async fn produce_report(
    settings: &Settings,
    workspace: &Path,
    query: ReportQuery,
    mode: GenerationMode,
) -> Result<GeneratedReport, ReportError> {
    let provider = resolve_provider(settings, workspace)?;
    let client = (mode == GenerationMode::Auto && settings.has_api_key())
        .then(|| AiClient::from_settings(settings));

    produce_report_with(
        settings,
        provider.as_ref(),
        client.as_ref().map(|c| c as &dyn Completer),
        workspace,
        query,
    )
    .await
}

/// [`produce_report`] with an explicit provider and optional backend.
///
/// `None` for `completer` selects the fallback digest. The settings author
/// filter applies when the query carries none.
pub async fn produce_report_with(
    settings: &Settings,
    provider: &dyn VcsProvider,
    completer: Option<&dyn Completer>,
    workspace: &Path,
    query: ReportQuery,
) -> Result<GeneratedReport, ReportError> {
    let query = if query.author.is_none() {
        query.with_author(settings.author_filter.clone())
    } else {
        query
    };

    info!(
        "Collecting {} commits from {} ({} report)",
        provider.kind(),
        workspace.display(),
        query.kind
    );
    let commits = provider.get_commits(workspace, &query).await?;
    if commits.is_empty() {
        return Err(ReportError::NoCommits);
    }
    debug!("{} commits matched", commits.len());

    let generator = ReportGenerator::new(settings.language);
    match completer {
        Some(completer) => {
            generator
                .generate_ai(&commits, query.kind, &query.range, completer)
                .await
        }
        None => generator.generate_simple(&commits, query.kind, &query.range),
    }
}

/// Draft a commit message for the pending changes in `scope`.
///
/// Requires an API key and a Git working tree.
pub async fn produce_commit_message(
    settings: &Settings,
    workspace: &Path,
    scope: DiffScope,
) -> Result<String, ReportError> {
    if !settings.has_api_key() {
        return Err(ConfigError::MissingApiKey.into());
    }
    let git = open_git(workspace)?;
    let diff = git.working_diff(workspace, scope)?;
    let client = AiClient::from_settings(settings);
    commit_message_from_diff(&diff, settings.language, &client).await
}

/// Commit message for an already collected diff.
pub async fn commit_message_from_diff(
    diff: &str,
    language: Language,
    completer: &dyn Completer,
) -> Result<String, ReportError> {
    if diff.trim().is_empty() {
        return Err(ReportError::NoChanges);
    }
    let prompt = build_commit_message_prompt(diff, language);
    let message = completer.complete(&prompt).await?;
    Ok(strip_code_fence(&message))
}

/// Summarize the changes in `span` of the Git history.
pub async fn produce_change_summary(
    settings: &Settings,
    workspace: &Path,
    span: ChangeSpan,
) -> Result<ChangeSummary, ReportError> {
    if !settings.has_api_key() {
        return Err(ConfigError::MissingApiKey.into());
    }
    let client = AiClient::from_settings(settings);
    produce_change_summary_with(settings, workspace, span, &client, Local::now()).await
}

/// [`produce_change_summary`] with an injected backend and timestamp.
pub async fn produce_change_summary_with(
    settings: &Settings,
    workspace: &Path,
    span: ChangeSpan,
    completer: &dyn Completer,
    generated_at: DateTime<Local>,
) -> Result<ChangeSummary, ReportError> {
    let git = open_git(workspace)?;
    let (commits, diff) = collect_span(&git, workspace, &span)?;

    let summary = summarize_changes(&commits, &diff, settings.language, completer).await?;
    Ok(ChangeSummary {
        content: change_summary_document(&summary, &commits, generated_at, settings.language),
        file_stem: change_summary_file_stem(generated_at),
    })
}

/// AI summary body for a diff and the commits that produced it.
pub async fn summarize_changes(
    commits: &[RecentCommit],
    diff: &str,
    language: Language,
    completer: &dyn Completer,
) -> Result<String, ReportError> {
    if diff.trim().is_empty() {
        return Err(ReportError::NoChanges);
    }
    let prompt = build_change_summary_prompt(commits, diff, language);
    debug!("Change summary prompt: {} chars", prompt.chars().count());
    Ok(completer.complete(&prompt).await?)
}

/// Commits (oldest first) and the diff covering `span`.
fn collect_span(
    git: &GitProvider,
    workspace: &Path,
    span: &ChangeSpan,
) -> Result<(Vec<RecentCommit>, String), ReportError> {
    match span {
        ChangeSpan::Recent(count) => {
            if *count == 0 {
                return Err(ReportError::NoChanges);
            }
            let mut commits = git.recent_commits(workspace, *count)?;
            commits.reverse();
            let diff = git.recent_diff(workspace, *count)?;
            Ok((commits, diff))
        }
        ChangeSpan::Between { from, to } => {
            let listing = git.recent_commits(workspace, RANGE_PICKER_DEPTH)?;
            let first = find_commit(&listing, from)?;
            let second = find_commit(&listing, to)?;

            // Larger index is older in a newest-first listing
            let (older, newer) = if first >= second {
                (&listing[first], &listing[second])
            } else {
                (&listing[second], &listing[first])
            };
            let diff = git.range_diff(workspace, &older.id, &newer.id)?;
            Ok((vec![older.clone(), newer.clone()], diff))
        }
    }
}

/// Position of `id` in `listing`, accepting abbreviated or full hashes.
fn find_commit(listing: &[RecentCommit], id: &str) -> Result<usize, VcsError> {
    let wanted = id.trim().to_lowercase();
    listing
        .iter()
        .position(|c| !wanted.is_empty() && (c.id.starts_with(&wanted) || wanted.starts_with(&c.id)))
        .ok_or_else(|| {
            VcsError::query_failed(
                "Git",
                format!("commit '{}' is not among the last {} commits", id, RANGE_PICKER_DEPTH),
            )
        })
}

fn open_git(workspace: &Path) -> Result<GitProvider, VcsError> {
    let git = GitProvider::new();
    if !git.is_repository(workspace) {
        return Err(not_a_repository(VcsKind::Git, workspace));
    }
    Ok(git)
}

fn not_a_repository(kind: VcsKind, workspace: &Path) -> VcsError {
    VcsError::NotARepository {
        kind: kind.display_name().to_string(),
        path: workspace.display().to_string(),
    }
}

/// Drop a surrounding Markdown code fence some models add despite instructions.
fn strip_code_fence(message: &str) -> String {
    let trimmed = message.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // skip an optional language tag on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}
