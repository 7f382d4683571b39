//! Markdown assembly for reports and change summaries.

use chrono::{DateTime, Local};

use crate::config::Language;
use crate::dates::{display_range, filename_date_part};
use crate::prompt::format_file_list;
use crate::vcs::{CommitRecord, DateRange, RecentCommit, ReportKind};

/// Maximum file names listed per commit in the fallback digest.
pub const DIGEST_FILE_CAP: usize = 3;

/// Maximum characters of a commit subject shown in the commit table.
pub const TABLE_MESSAGE_LEN: usize = 50;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Title line text, without the leading `#`.
pub fn report_title(kind: ReportKind, range: &DateRange, language: Language) -> String {
    match (kind, language) {
        (ReportKind::Daily, Language::Chinese) => {
            format!("工作日报 - {}", range.start.format("%Y年%m月%d日"))
        }
        (ReportKind::Daily, Language::English) => {
            format!("Daily Report - {}", range.start.format("%Y-%m-%d"))
        }
        (ReportKind::Weekly, Language::Chinese) => format!(
            "工作周报 - {}-{}",
            range.start.format("%m月%d日"),
            range.end.format("%m月%d日")
        ),
        (ReportKind::Weekly, Language::English) => format!(
            "Weekly Report - {} to {}",
            range.start.format("%m-%d"),
            range.end.format("%m-%d")
        ),
        (ReportKind::Custom, Language::Chinese) => "工作报告".to_string(),
        (ReportKind::Custom, Language::English) => "Work Report".to_string(),
    }
}

/// File name without extension, e.g. `weekly_2024-03-11_2024-03-17`.
pub fn report_file_stem(kind: ReportKind, range: &DateRange) -> String {
    let prefix = match kind {
        ReportKind::Daily => "daily",
        ReportKind::Weekly => "weekly",
        ReportKind::Custom => "report",
    };
    format!("{}_{}", prefix, filename_date_part(range))
}

/// Title, generation time, period and commit count, closed by a rule.
pub fn report_header(
    title: &str,
    generated_at: DateTime<Local>,
    range: &DateRange,
    commit_count: usize,
    language: Language,
) -> String {
    let (generated, period, count) = match language {
        Language::Chinese => ("生成时间", "统计周期", "提交数量"),
        Language::English => ("Generated", "Period", "Commits"),
    };
    format!(
        "# {title}\n\n> {generated}: {}\n> {period}: {}\n> {count}: {commit_count}\n\n---\n\n",
        generated_at.format(TIMESTAMP_FORMAT),
        display_range(range),
    )
}

/// Verbatim commit listing appended to AI reports.
pub fn commit_table(commits: &[CommitRecord], language: Language) -> String {
    let (heading, time, id, author, message) = match language {
        Language::Chinese => ("提交记录明细", "时间", "ID", "作者", "提交信息"),
        Language::English => ("Commit Details", "Time", "ID", "Author", "Message"),
    };

    let mut table = format!(
        "## {heading}\n\n| {time} | {id} | {author} | {message} |\n|------|-----|------|----------|\n"
    );
    for commit in commits {
        let subject: String = commit.subject().chars().take(TABLE_MESSAGE_LEN).collect();
        table.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            commit.date.format("%m-%d %H:%M"),
            escape_cell(&commit.id),
            escape_cell(&commit.author),
            escape_cell(&subject),
        ));
    }
    table
}

/// Commits grouped by local calendar day.
///
/// Groups appear in order of their first commit; commits keep their input
/// order within a group.
pub fn group_by_day(commits: &[CommitRecord]) -> Vec<(String, Vec<&CommitRecord>)> {
    let mut groups: Vec<(String, Vec<&CommitRecord>)> = Vec::new();
    for commit in commits {
        let day = commit.date.format("%Y-%m-%d").to_string();
        match groups.iter_mut().find(|(d, _)| *d == day) {
            Some((_, members)) => members.push(commit),
            None => groups.push((day, vec![commit])),
        }
    }
    groups
}

/// Day-by-day digest used when no AI backend is available.
pub fn fallback_digest(commits: &[CommitRecord], language: Language) -> String {
    let files_label = match language {
        Language::Chinese => "修改文件",
        Language::English => "Files",
    };

    let mut body = String::new();
    for (day, members) in group_by_day(commits) {
        body.push_str(&format!("## {}\n\n", day));
        for commit in members {
            body.push_str(&format!("- **{}** ({})\n", commit.subject(), commit.id));
            if let Some(files) = commit.files.as_deref().filter(|f| !f.is_empty()) {
                body.push_str(&format!(
                    "  - {}: {}\n",
                    files_label,
                    format_file_list(files, DIGEST_FILE_CAP, language)
                ));
            }
        }
        body.push('\n');
    }
    body
}

/// Full change-summary document around the AI body.
///
/// `commits` are listed in the order given, joined by arrows.
pub fn change_summary_document(
    summary: &str,
    commits: &[RecentCommit],
    generated_at: DateTime<Local>,
    language: Language,
) -> String {
    let (title, generated, scope) = match language {
        Language::Chinese => ("代码变更摘要", "生成时间", "分析范围"),
        Language::English => ("Code Change Summary", "Generated", "Range"),
    };
    let ids = commits.iter().map(|c| c.id.as_str()).collect::<Vec<_>>().join(" → ");
    format!(
        "# {title}\n\n> {generated}: {}\n> {scope}: {ids}\n\n---\n\n{summary}",
        generated_at.format(TIMESTAMP_FORMAT),
    )
}

/// `change_summary_YYYYMMDD_HHMMSS`.
pub fn change_summary_file_stem(generated_at: DateTime<Local>) -> String {
    format!("change_summary_{}", generated_at.format("%Y%m%d_%H%M%S"))
}

/// Escape characters that would break a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
