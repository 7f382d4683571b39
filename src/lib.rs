//! workscribe - turns Git/SVN history into work reports, commit messages, and
//! change summaries.
//!
//! # Overview
//!
//! A VCS provider (Git through git2, SVN through the `svn` binary) collects the
//! commits for a date range. The commits are rendered into a prompt and sent to
//! one of the supported AI backends, and the answer is assembled into a
//! Markdown report. Without an API key the report falls back to a plain
//! day-by-day digest.

pub mod ai;
pub mod config;
pub mod dates;
pub mod error;
pub mod output;
pub mod prompt;
pub mod report;
pub mod vcs;

// Re-export commonly used types
pub use ai::{AiClient, AiProvider, Completer};
pub use config::{Language, Settings, SettingsOverrides};
pub use error::{AiError, ConfigError, ReportError, VcsError};
pub use report::{ChangeSpan, ChangeSummary, GeneratedReport, GenerationMode, ReportGenerator};
pub use vcs::{
    CommitRecord, DateRange, DiffScope, RecentCommit, ReportKind, ReportQuery, VcsKind,
    VcsProvider, VcsSelector,
};
