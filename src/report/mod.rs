//! Report assembly and the generation workflows.
//!
//! [`ReportGenerator`] turns an already-fetched commit list into Markdown,
//! either through an AI backend or with the day-by-day fallback digest. The
//! `produce_*` functions in [`workflow`] wire providers, prompts and backends
//! together for callers.

pub mod markdown;
pub mod workflow;

pub use workflow::{
    ChangeSpan, ChangeSummary, GenerationMode, commit_message_from_diff, produce_change_summary,
    produce_change_summary_with, produce_commit_message, produce_report, produce_report_with,
    resolve_provider, summarize_changes,
};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::ai::Completer;
use crate::config::Language;
use crate::error::ReportError;
use crate::prompt::build_summary_prompt;
use crate::vcs::{CommitRecord, DateRange, ReportKind};

use markdown::{commit_table, fallback_digest, report_file_stem, report_header, report_title};

/// A finished report, ready to be written or printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReport {
    pub content: String,
    /// Suggested file name without the `.md` extension.
    pub file_stem: String,
    pub commit_count: usize,
    pub used_ai: bool,
}

/// Renders reports for one language at a fixed generation time.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    language: Language,
    generated_at: DateTime<Local>,
}

impl ReportGenerator {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            generated_at: Local::now(),
        }
    }

    /// Override the timestamp written into the header.
    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = at;
        self
    }

    /// AI narrative followed by the verbatim commit table.
    pub async fn generate_ai(
        &self,
        commits: &[CommitRecord],
        kind: ReportKind,
        range: &DateRange,
        completer: &dyn Completer,
    ) -> Result<GeneratedReport, ReportError> {
        if commits.is_empty() {
            return Err(ReportError::NoCommits);
        }

        let prompt = build_summary_prompt(commits, kind, self.language);
        debug!("Summary prompt: {} chars for {} commits", prompt.chars().count(), commits.len());
        let summary = completer.complete(&prompt).await?;

        let mut content = self.header(commits, kind, range);
        content.push_str(summary.trim_end());
        content.push_str("\n\n---\n\n");
        content.push_str(&commit_table(commits, self.language));

        Ok(GeneratedReport {
            content,
            file_stem: report_file_stem(kind, range),
            commit_count: commits.len(),
            used_ai: true,
        })
    }

    /// Day-by-day digest with no network access.
    pub fn generate_simple(
        &self,
        commits: &[CommitRecord],
        kind: ReportKind,
        range: &DateRange,
    ) -> Result<GeneratedReport, ReportError> {
        if commits.is_empty() {
            return Err(ReportError::NoCommits);
        }

        let mut content = self.header(commits, kind, range);
        content.push_str(&fallback_digest(commits, self.language));

        Ok(GeneratedReport {
            content,
            file_stem: report_file_stem(kind, range),
            commit_count: commits.len(),
            used_ai: false,
        })
    }

    fn header(&self, commits: &[CommitRecord], kind: ReportKind, range: &DateRange) -> String {
        let title = report_title(kind, range, self.language);
        report_header(&title, self.generated_at, range, commits.len(), self.language)
    }
}
