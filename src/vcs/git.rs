//! Git backend using git2-rs.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use git2::{Commit, Diff, DiffFormat, ErrorCode, Oid, Repository, Sort, Tree};
use tracing::{debug, warn};

use crate::error::VcsError;

use super::{CommitRecord, RecentCommit, ReportQuery, VcsKind, VcsProvider, has_marker_dir};

/// Number of hash characters used as a commit id.
const SHORT_ID_LEN: usize = 8;

/// Maximum characters of the subject shown in recent-commit listings.
const LISTING_MESSAGE_LEN: usize = 50;

/// Which part of the working tree to diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffScope {
    Staged,
    Unstaged,
    /// Staged followed by unstaged.
    All,
}

impl DiffScope {
    fn includes_staged(self) -> bool {
        matches!(self, DiffScope::Staged | DiffScope::All)
    }

    fn includes_unstaged(self) -> bool {
        matches!(self, DiffScope::Unstaged | DiffScope::All)
    }
}

impl FromStr for DiffScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "staged" => Ok(DiffScope::Staged),
            "unstaged" => Ok(DiffScope::Unstaged),
            "all" => Ok(DiffScope::All),
            _ => Err(format!("Unknown diff scope: {}", s)),
        }
    }
}

/// Git provider. Stateless; every call opens the repository fresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitProvider;

impl GitProvider {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous body of [`VcsProvider::get_commits`].
    pub fn fetch_commits(
        &self,
        path: &Path,
        query: &ReportQuery,
    ) -> Result<Vec<CommitRecord>, VcsError> {
        if query.range.is_inverted() {
            debug!("Inverted date range, no commits can match");
            return Ok(Vec::new());
        }

        let backend = VcsKind::Git.display_name();
        let repo = Repository::open(path).map_err(|e| VcsError::query_failed(backend, e))?;

        if resolve_head_tree(&repo)?.is_none() {
            debug!("Repository has no commits yet");
            return Ok(Vec::new());
        }

        let mut revwalk = repo
            .revwalk()
            .map_err(|e| VcsError::query_failed(backend, e))?;
        revwalk
            .set_sorting(Sort::TIME)
            .map_err(|e| VcsError::query_failed(backend, e))?;
        revwalk
            .push_head()
            .map_err(|e| VcsError::query_failed(backend, e))?;

        let mut commits = Vec::new();

        for oid_result in revwalk {
            let oid = oid_result.map_err(|e| VcsError::query_failed(backend, e))?;
            let commit = repo
                .find_commit(oid)
                .map_err(|e| VcsError::query_failed(backend, e))?;

            let Some(date) = commit_date(&commit) else {
                warn!("Commit {} has an invalid timestamp, skipping", oid);
                continue;
            };
            if !query.range.contains(&date) {
                continue;
            }

            let author = commit.author();
            let name = author.name().unwrap_or("unknown").to_string();
            let email = author.email().map(str::to_string);
            if !query.matches_author(&name, email.as_deref()) {
                continue;
            }

            let mut record = CommitRecord {
                id: short_id(oid),
                message: commit.message().unwrap_or("").trim_end().to_string(),
                author: name,
                email,
                date,
                files: None,
                diff: None,
            };

            if query.include_files {
                match changed_files(&repo, &commit) {
                    Ok(files) => record.files = Some(files),
                    Err(e) => warn!("Could not list files for commit {}: {}", record.id, e),
                }
            }

            if query.include_diff {
                match parent_diff(&repo, &commit) {
                    Ok(diff) => record.diff = Some(diff),
                    Err(e) => debug!("No parent diff for commit {}: {}", record.id, e),
                }
            }

            commits.push(record);
        }

        debug!("Collected {} git commits", commits.len());
        Ok(commits)
    }

    /// Unified diff of pending working-tree changes.
    pub fn working_diff(&self, path: &Path, scope: DiffScope) -> Result<String, VcsError> {
        let repo = Repository::open(path).map_err(VcsError::Git)?;
        let mut text = String::new();

        if scope.includes_staged() {
            let head_tree = resolve_head_tree(&repo)?;
            let staged = repo
                .diff_tree_to_index(head_tree.as_ref(), None, None)
                .map_err(VcsError::Git)?;
            text.push_str(&patch_text(&staged).map_err(VcsError::Git)?);
        }

        if scope.includes_unstaged() {
            let unstaged = repo
                .diff_index_to_workdir(None, None)
                .map_err(VcsError::Git)?;
            text.push_str(&patch_text(&unstaged).map_err(VcsError::Git)?);
        }

        Ok(text)
    }

    /// Diff spanning the last `count` commits (`HEAD~count..HEAD`).
    ///
    /// When the history is shorter than `count`, the diff starts from the
    /// empty tree.
    pub fn recent_diff(&self, path: &Path, count: usize) -> Result<String, VcsError> {
        let repo = Repository::open(path).map_err(VcsError::Git)?;
        let head_tree = repo
            .head()
            .and_then(|h| h.peel_to_tree())
            .map_err(VcsError::Git)?;

        let base_tree = match repo.revparse_single(&format!("HEAD~{count}")) {
            Ok(obj) => Some(obj.peel_to_tree().map_err(VcsError::Git)?),
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
                debug!("HEAD~{} not found, diffing from the empty tree", count);
                None
            }
            Err(e) => return Err(VcsError::Git(e)),
        };

        let diff = repo
            .diff_tree_to_tree(base_tree.as_ref(), Some(&head_tree), None)
            .map_err(VcsError::Git)?;
        patch_text(&diff).map_err(VcsError::Git)
    }

    /// Diff between two named commits (hash, branch, or tag).
    pub fn range_diff(&self, path: &Path, from: &str, to: &str) -> Result<String, VcsError> {
        let repo = Repository::open(path).map_err(VcsError::Git)?;
        let from_tree = resolve_tree(&repo, from)?;
        let to_tree = resolve_tree(&repo, to)?;

        let diff = repo
            .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), None)
            .map_err(VcsError::Git)?;
        patch_text(&diff).map_err(VcsError::Git)
    }

    /// The most recent `count` commits, newest first.
    pub fn recent_commits(&self, path: &Path, count: usize) -> Result<Vec<RecentCommit>, VcsError> {
        let repo = Repository::open(path).map_err(VcsError::Git)?;
        if resolve_head_tree(&repo)?.is_none() {
            return Ok(Vec::new());
        }

        let mut revwalk = repo.revwalk().map_err(VcsError::Git)?;
        revwalk.set_sorting(Sort::TIME).map_err(VcsError::Git)?;
        revwalk.push_head().map_err(VcsError::Git)?;

        let mut listing = Vec::with_capacity(count);
        for oid_result in revwalk.take(count) {
            let oid = oid_result.map_err(VcsError::Git)?;
            let commit = repo.find_commit(oid).map_err(VcsError::Git)?;

            let subject = commit.message().unwrap_or("").lines().next().unwrap_or("");
            let date = commit_date(&commit)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();

            listing.push(RecentCommit {
                id: short_id(oid),
                message: subject.chars().take(LISTING_MESSAGE_LEN).collect(),
                date,
            });
        }

        Ok(listing)
    }

    /// `user.name` and `user.email` from the repository's effective config.
    pub fn current_identity(&self, path: &Path) -> Option<(String, Option<String>)> {
        let repo = Repository::open(path).ok()?;
        let config = repo.config().ok()?;
        let name = config.get_string("user.name").ok()?;
        let email = config.get_string("user.email").ok();
        Some((name, email))
    }
}

#[async_trait]
impl VcsProvider for GitProvider {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn is_repository(&self, path: &Path) -> bool {
        has_marker_dir(path, ".git")
    }

    async fn get_commits(
        &self,
        path: &Path,
        query: &ReportQuery,
    ) -> Result<Vec<CommitRecord>, VcsError> {
        self.fetch_commits(path, query)
    }

    async fn current_user(&self, path: &Path) -> Option<String> {
        self.current_identity(path).map(|(name, _)| name)
    }
}

fn short_id(oid: Oid) -> String {
    oid.to_string().chars().take(SHORT_ID_LEN).collect()
}

/// Author time in the local timezone.
fn commit_date(commit: &Commit<'_>) -> Option<DateTime<Local>> {
    let when = commit.author().when();
    Local.timestamp_opt(when.seconds(), 0).single()
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, VcsError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(VcsError::query_failed(VcsKind::Git.display_name(), e)),
    };

    let tree = head_ref
        .peel_to_tree()
        .map_err(|e| VcsError::query_failed(VcsKind::Git.display_name(), e))?;
    Ok(Some(tree))
}

fn resolve_tree<'r>(repo: &'r Repository, reference: &str) -> Result<Tree<'r>, VcsError> {
    repo.revparse_single(reference)
        .and_then(|obj| obj.peel_to_tree())
        .map_err(VcsError::Git)
}

/// Paths touched by `commit`, compared against its first parent.
///
/// The root commit has no parent, so it is compared against the empty tree.
fn changed_files(repo: &Repository, commit: &Commit<'_>) -> Result<Vec<String>, git2::Error> {
    let tree = commit.tree()?;
    let diff = match commit.parent(0) {
        Ok(parent) => repo.diff_tree_to_tree(Some(&parent.tree()?), Some(&tree), None)?,
        Err(_) => repo.diff_tree_to_tree(None, Some(&tree), None)?,
    };

    let files = diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned())
        })
        .collect();
    Ok(files)
}

/// Patch text against the first parent. Fails for the root commit.
fn parent_diff(repo: &Repository, commit: &Commit<'_>) -> Result<String, git2::Error> {
    let parent = commit.parent(0)?;
    let diff = repo.diff_tree_to_tree(Some(&parent.tree()?), Some(&commit.tree()?), None)?;
    patch_text(&diff)
}

/// Render a diff as unified patch text.
fn patch_text(diff: &Diff<'_>) -> Result<String, git2::Error> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_scope_parsing() {
        assert_eq!("staged".parse::<DiffScope>().unwrap(), DiffScope::Staged);
        assert_eq!("Unstaged".parse::<DiffScope>().unwrap(), DiffScope::Unstaged);
        assert_eq!("all".parse::<DiffScope>().unwrap(), DiffScope::All);
        assert!("head".parse::<DiffScope>().is_err());
    }

    #[test]
    fn test_is_repository_false_for_missing_path() {
        let provider = GitProvider::new();
        assert!(!provider.is_repository(Path::new("/definitely/not/here")));
    }

    #[test]
    fn test_is_repository_detects_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(GitProvider::new().is_repository(dir.path()));
    }

    #[test]
    fn test_fetch_commits_on_empty_repo_is_empty() {
        use crate::vcs::{DateRange, ReportKind};

        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();

        let range = DateRange::new(
            Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
        );
        let query = ReportQuery::new(ReportKind::Custom, range);
        let commits = GitProvider::new().fetch_commits(dir.path(), &query).unwrap();
        assert!(commits.is_empty());
    }

    #[test]
    fn test_fetch_commits_outside_repo_is_query_failed() {
        use crate::vcs::{DateRange, ReportKind};

        let dir = tempfile::tempdir().unwrap();
        let range = DateRange::new(
            Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
        );
        let query = ReportQuery::new(ReportKind::Custom, range);
        let result = GitProvider::new().fetch_commits(dir.path(), &query);
        assert!(
            matches!(result, Err(VcsError::QueryFailed { ref backend, .. }) if backend == "Git"),
            "Expected QueryFailed, got: {:?}",
            result
        );
    }

    #[test]
    fn test_query_failed_keeps_git_error_as_source() {
        use crate::vcs::{DateRange, ReportKind};
        use std::error::Error as _;

        let dir = tempfile::tempdir().unwrap();
        let range = DateRange::new(
            Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
        );
        let query = ReportQuery::new(ReportKind::Custom, range);
        let err = GitProvider::new()
            .fetch_commits(dir.path(), &query)
            .unwrap_err();

        let source = err.source().expect("QueryFailed should carry its cause");
        assert!(source.downcast_ref::<git2::Error>().is_some());
        assert!(err.to_string().starts_with("Failed to query Git history: "));
    }
}
