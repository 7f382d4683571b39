//! Change summary prompt over a span of commits.

use crate::config::Language;
use crate::vcs::RecentCommit;

use super::truncate_with_marker;

/// Maximum diff characters sent for a change summary.
pub const CHANGE_SUMMARY_DIFF_BUDGET: usize = 12_000;

/// Build the prompt asking for a reviewer-oriented summary of `diff`.
///
/// `commits` supplies the ids and messages that produced the diff.
pub fn build_change_summary_prompt(commits: &[RecentCommit], diff: &str, language: Language) -> String {
    let commit_list = commits
        .iter()
        .map(|c| format!("- {}: {}", c.id, c.message))
        .collect::<Vec<_>>()
        .join("\n");
    let diff = truncate_with_marker(diff, CHANGE_SUMMARY_DIFF_BUDGET);

    format!(
        r#"You are reviewing a set of code changes. Summarize them for a teammate.

## Commits
{commit_list}

## Diff
```
{diff}
```

## Output Format
Respond in {language} using Markdown with exactly these sections:

### Overview
(One or two sentences on the purpose of these changes)

### Key Changes
(Bullet list of the main modifications, grouped by area)

### Technical Details
(Notable implementation decisions)

### Potential Risks
(Regressions or edge cases to watch; write "No obvious risks" if none)

### Suggestions
(Follow-up improvements; write "No suggestions" if none)

Output the summary directly without additional explanations."#,
        language = language.english_name(),
    )
}
