//! Subversion backend driving the `svn` command-line client.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::VcsError;

use super::{CommitRecord, ReportQuery, VcsKind, VcsProvider, has_marker_dir};

/// Author recorded when a log entry carries none.
const UNKNOWN_AUTHOR: &str = "unknown";

/// Raw `svn log --xml` document.
#[derive(Debug, Deserialize)]
struct LogDocument {
    #[serde(rename = "logentry", default)]
    entries: Vec<LogEntryXml>,
}

#[derive(Debug, Deserialize)]
struct LogEntryXml {
    #[serde(rename = "@revision")]
    revision: String,
    author: Option<String>,
    date: Option<String>,
    msg: Option<String>,
    paths: Option<PathsXml>,
}

#[derive(Debug, Deserialize)]
struct PathsXml {
    #[serde(rename = "path", default)]
    items: Vec<PathXml>,
}

#[derive(Debug, Deserialize)]
struct PathXml {
    #[serde(rename = "$text", default)]
    value: String,
}

/// One parsed log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnLogRecord {
    /// Display id, `r<revision>`.
    pub revision: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub message: String,
    /// Changed paths; present only in verbose logs.
    pub paths: Option<Vec<String>>,
}

impl SvnLogRecord {
    fn into_commit(self) -> CommitRecord {
        CommitRecord {
            id: self.revision,
            message: self.message,
            author: self.author,
            email: None,
            date: self.date.with_timezone(&Local),
            files: self.paths,
            diff: None,
        }
    }
}

/// Parse the output of `svn log --xml [-v]`.
///
/// Entries without a parseable date are skipped with a warning.
pub fn parse_svn_log(xml: &str) -> Result<Vec<SvnLogRecord>, VcsError> {
    let document: LogDocument =
        quick_xml::de::from_str(xml).map_err(|e| VcsError::InvalidLogXml(e.to_string()))?;

    let mut records = Vec::with_capacity(document.entries.len());
    for entry in document.entries {
        let Some(date) = entry
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok())
        else {
            warn!("svn log entry r{} has no valid date, skipping", entry.revision);
            continue;
        };

        let paths = entry
            .paths
            .map(|p| {
                p.items
                    .into_iter()
                    .map(|item| item.value.trim().to_string())
                    .filter(|path| !path.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|paths| !paths.is_empty());

        records.push(SvnLogRecord {
            revision: format!("r{}", entry.revision.trim()),
            author: entry
                .author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            date: date.with_timezone(&Utc),
            message: entry.msg.unwrap_or_default().trim().to_string(),
            paths,
        });
    }

    Ok(records)
}

/// Format a bound for an `svn log -r {DATE}` revision bracket.
fn revision_date(at: &DateTime<Local>) -> String {
    format!("{{{}}}", at.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%SZ"))
}

/// Arguments for the log query; `-v` adds changed paths.
fn log_args(query: &ReportQuery) -> Vec<String> {
    let mut args = vec![
        "log".to_string(),
        "-r".to_string(),
        format!(
            "{}:{}",
            revision_date(&query.range.start),
            revision_date(&query.range.end)
        ),
        "--xml".to_string(),
    ];
    if query.include_files {
        args.push("-v".to_string());
    }
    args
}

/// Run `svn` in `path` and return its stdout.
async fn run_svn(path: &Path, args: &[String]) -> Result<String, VcsError> {
    if which::which("svn").is_err() {
        return Err(VcsError::ToolNotFound("svn"));
    }

    let output = Command::new("svn")
        .args(args)
        .current_dir(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(VcsError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(VcsError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// SVN provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvnProvider;

impl SvnProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Keep records inside the range and matching the author filter.
///
/// `svn log` cannot filter by author, and a date bracket also yields the
/// revision in effect at the start date, so both checks happen here.
fn select_records(records: Vec<SvnLogRecord>, query: &ReportQuery) -> Vec<CommitRecord> {
    let mut commits: Vec<CommitRecord> = records
        .into_iter()
        .map(SvnLogRecord::into_commit)
        .filter(|c| query.range.contains(&c.date))
        .filter(|c| query.matches_author(&c.author, None))
        .map(|mut c| {
            if !query.include_files {
                c.files = None;
            }
            c
        })
        .collect();

    // svn lists oldest first
    commits.sort_by(|a, b| b.date.cmp(&a.date));
    commits
}

#[async_trait]
impl VcsProvider for SvnProvider {
    fn kind(&self) -> VcsKind {
        VcsKind::Svn
    }

    fn is_repository(&self, path: &Path) -> bool {
        has_marker_dir(path, ".svn")
    }

    async fn get_commits(
        &self,
        path: &Path,
        query: &ReportQuery,
    ) -> Result<Vec<CommitRecord>, VcsError> {
        if query.range.is_inverted() {
            debug!("Inverted date range, no revisions can match");
            return Ok(Vec::new());
        }

        let backend = VcsKind::Svn.display_name();
        let args = log_args(query);
        debug!("Running svn {}", args.join(" "));

        let xml = run_svn(path, &args)
            .await
            .map_err(|e| VcsError::query_failed(backend, e))?;
        let records = parse_svn_log(&xml).map_err(|e| VcsError::query_failed(backend, e))?;

        let commits = select_records(records, query);
        debug!("Collected {} svn revisions", commits.len());
        Ok(commits)
    }

    async fn current_user(&self, path: &Path) -> Option<String> {
        let args = ["info", "--show-item", "last-changed-author"].map(String::from);
        match run_svn(path, &args).await {
            Ok(out) if !out.trim().is_empty() => Some(out.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                debug!("Could not determine svn user: {}", e);
                None
            }
        }
    }
}
