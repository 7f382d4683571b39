//! Period summary prompt (daily, weekly, custom range).

use crate::config::Language;
use crate::vcs::{CommitRecord, ReportKind};

use super::{format_file_list, truncate_with_marker};

/// Maximum file names listed per commit.
pub const SUMMARY_FILE_CAP: usize = 5;

/// Maximum characters of combined diff text included when commits carry diffs.
pub const SUMMARY_DIFF_BUDGET: usize = 8000;

/// Build the prompt asking for a structured work report over `commits`.
///
/// Chinese and English use separate literal templates. Both name the same four
/// output sections so report assembly can rely on the structure.
pub fn build_summary_prompt(commits: &[CommitRecord], kind: ReportKind, language: Language) -> String {
    let commit_list = commits
        .iter()
        .map(|c| commit_entry(c, language))
        .collect::<Vec<_>>()
        .join("\n");
    let diff_section = diff_section(commits, language);

    match language {
        Language::Chinese => {
            let kind_name = match kind {
                ReportKind::Daily => "日报",
                ReportKind::Weekly => "周报",
                ReportKind::Custom => "报告",
            };
            let period = if kind == ReportKind::Daily { "日" } else { "周期" };
            format!(
                r#"你是一个专业的技术文档撰写助手。请根据以下Git/SVN提交记录，生成一份结构化的工作{kind_name}。

## 提交记录
{commit_list}
{diff_section}
## 要求
1. 用中文撰写
2. 按功能模块或工作类型分类总结
3. 突出重点工作成果
4. 语言简洁专业
5. 使用Markdown格式

## 输出格式
### 工作概述
（一句话总结本{period}主要工作）

### 完成事项
（按类别列出完成的工作）

### 技术细节
（如有重要的技术实现，简要说明）

### 下一步计划
（可选，如果能从提交记录推断）

请直接输出报告内容，不要有额外的解释。"#
            )
        }
        Language::English => {
            let kind_name = match kind {
                ReportKind::Daily => "daily report",
                ReportKind::Weekly => "weekly report",
                ReportKind::Custom => "report",
            };
            format!(
                r#"You are a professional technical documentation assistant. Please generate a structured work {kind_name} based on the following Git/SVN commit records.

## Commit Records
{commit_list}
{diff_section}
## Requirements
1. Write in English
2. Categorize by feature modules or work types
3. Highlight key achievements
4. Use concise and professional language
5. Use Markdown format

## Output Format
### Overview
(One sentence summary of the main work)

### Completed Tasks
(List completed work by category)

### Technical Details
(Brief explanation of important technical implementations, if any)

### Next Steps
(Optional, if inferable from commit records)

Please output the report content directly without additional explanations."#
            )
        }
    }
}

/// Combined diff bodies of commits that carry one, or an empty string.
fn diff_section(commits: &[CommitRecord], language: Language) -> String {
    let combined = commits
        .iter()
        .filter_map(|c| c.diff.as_deref().filter(|d| !d.trim().is_empty()))
        .collect::<Vec<_>>()
        .join("\n");
    if combined.is_empty() {
        return String::new();
    }
    let heading = match language {
        Language::Chinese => "代码变更",
        Language::English => "Code Changes",
    };
    format!(
        "\n## {}\n```diff\n{}\n```\n",
        heading,
        truncate_with_marker(&combined, SUMMARY_DIFF_BUDGET)
    )
}

fn commit_entry(commit: &CommitRecord, language: Language) -> String {
    let mut entry = format!("- [{}] {}", commit.id, commit.message);
    if let Some(files) = commit.files.as_deref().filter(|f| !f.is_empty()) {
        let label = match language {
            Language::Chinese => "修改文件",
            Language::English => "Files",
        };
        entry.push_str(&format!(
            "\n  {}: {}",
            label,
            format_file_list(files, SUMMARY_FILE_CAP, language)
        ));
    }
    entry
}
