//! Version-control backends and the normalized commit model.
//!
//! Every backend turns its own log output into [`CommitRecord`]s for a
//! [`ReportQuery`]. Git-only capabilities (working-tree diffs, recent commit
//! listings) live on [`GitProvider`] directly and are not part of the trait.

pub mod git;
pub mod registry;
pub mod svn;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use crate::error::VcsError;

pub use git::{DiffScope, GitProvider};
pub use registry::{VcsRegistry, detect_provider, provider_for_kind, provider_for_type};
pub use svn::{SvnLogRecord, SvnProvider, parse_svn_log};

/// One commit, normalized across backends.
///
/// Built fresh per query and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Short hash for Git, `r<revision>` for SVN.
    pub id: String,
    /// Full message; empty string when the commit has none.
    pub message: String,
    pub author: String,
    pub email: Option<String>,
    pub date: DateTime<Local>,
    pub files: Option<Vec<String>>,
    pub diff: Option<String>,
}

impl CommitRecord {
    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Inclusive time window for commit membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl DateRange {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    /// True when `start > end`; such a range matches nothing.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, at: &DateTime<Local>) -> bool {
        *at >= self.start && *at <= self.end
    }
}

/// Kind of report, which drives titles and filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Daily,
    Weekly,
    Custom,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Daily => "daily",
            ReportKind::Weekly => "weekly",
            ReportKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to fetch for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub kind: ReportKind,
    pub range: DateRange,
    /// Case-insensitive substring matched against the author.
    pub author: Option<String>,
    pub include_files: bool,
    pub include_diff: bool,
}

impl ReportQuery {
    /// A query that includes file lists but no diff bodies.
    pub fn new(kind: ReportKind, range: DateRange) -> Self {
        Self {
            kind,
            range,
            author: None,
            include_files: true,
            include_diff: false,
        }
    }

    /// Set the author filter. Blank filters are treated as no filter.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        self.author = if author.trim().is_empty() {
            None
        } else {
            Some(author)
        };
        self
    }

    pub fn with_files(mut self, include: bool) -> Self {
        self.include_files = include;
        self
    }

    pub fn with_diff(mut self, include: bool) -> Self {
        self.include_diff = include;
        self
    }

    /// Whether a commit by `name` (and optionally `email`) passes the author filter.
    pub fn matches_author(&self, name: &str, email: Option<&str>) -> bool {
        let Some(filter) = self.author.as_deref() else {
            return true;
        };
        let needle = filter.to_lowercase();
        name.to_lowercase().contains(&needle)
            || email.is_some_and(|e| e.to_lowercase().contains(&needle))
    }
}

/// Lightweight listing entry used for interactive commit selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentCommit {
    pub id: String,
    /// First line, at most 50 characters.
    pub message: String,
    /// `YYYY-MM-DD`.
    pub date: String,
}

/// Concrete backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
    Svn,
}

impl VcsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Svn => "svn",
        }
    }

    /// Name used in user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            VcsKind::Git => "Git",
            VcsKind::Svn => "SVN",
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for VcsKind {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "git" => Ok(VcsKind::Git),
            "svn" => Ok(VcsKind::Svn),
            _ => Err(VcsError::UnsupportedType(s.to_string())),
        }
    }
}

/// Configured backend selector: auto-detect or a fixed backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VcsSelector {
    #[default]
    Auto,
    Fixed(VcsKind),
}

impl FromStr for VcsSelector {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(VcsSelector::Auto);
        }
        s.parse().map(VcsSelector::Fixed)
    }
}

impl fmt::Display for VcsSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsSelector::Auto => f.write_str("auto"),
            VcsSelector::Fixed(kind) => f.write_str(kind.as_str()),
        }
    }
}

/// A version-control backend that can list commits for a query.
#[async_trait]
pub trait VcsProvider: Send + Sync {
    fn kind(&self) -> VcsKind;

    /// Whether `path` holds this backend's marker directory.
    ///
    /// Never fails: unreadable or missing paths report `false`.
    fn is_repository(&self, path: &Path) -> bool;

    /// Commits inside `query.range` (inclusive), newest first.
    ///
    /// Hard retrieval failures surface as [`VcsError::QueryFailed`]; per-commit
    /// file list or diff failures only drop that optional field.
    async fn get_commits(
        &self,
        path: &Path,
        query: &ReportQuery,
    ) -> Result<Vec<CommitRecord>, VcsError>;

    /// Name of the current VCS user, when the backend knows one.
    async fn current_user(&self, path: &Path) -> Option<String>;
}

/// Check for a marker directory such as `.git` under `path`.
pub(crate) fn has_marker_dir(path: &Path, marker: &str) -> bool {
    std::fs::metadata(path.join(marker))
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
