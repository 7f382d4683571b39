//! Commit message prompt.

use crate::config::Language;

use super::truncate_with_marker;

/// Maximum diff characters sent for a commit message.
pub const COMMIT_DIFF_BUDGET: usize = 8000;

/// Allowed first-line types.
pub const COMMIT_TYPES: [&str; 7] = ["feature", "fix", "docs", "style", "refactor", "test", "chore"];

/// Build the prompt asking for a single conventional-style commit message.
pub fn build_commit_message_prompt(diff: &str, language: Language) -> String {
    let diff = truncate_with_marker(diff, COMMIT_DIFF_BUDGET);
    let types = COMMIT_TYPES.join(", ");
    let language_rule = match language {
        Language::Chinese => "Write the description and body in Simplified Chinese; keep the type keyword in English.",
        Language::English => "Write the description and body in English.",
    };

    format!(
        r#"You are writing a Git commit message for the following changes.

## Diff
```
{diff}
```

## Rules
- First line: `type: short description`
- type is one of: {types}
- Keep the first line under 72 characters, no trailing period
- Optionally add a blank line followed by a short explanation of the change
- {language_rule}

Respond with the commit message only, without code fences or commentary."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::TRUNCATION_MARKER;

    #[test]
    fn test_prompt_lists_types_and_diff() {
        let prompt = build_commit_message_prompt("+fn main() {}", Language::English);
        assert!(prompt.contains("+fn main() {}"));
        assert!(prompt.contains("feature, fix, docs, style, refactor, test, chore"));
        assert!(prompt.contains("`type: short description`"));
        assert!(!prompt.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_long_diff_is_clipped_at_budget() {
        let diff = format!("{}{}", "x".repeat(COMMIT_DIFF_BUDGET), "TAIL");
        let prompt = build_commit_message_prompt(&diff, Language::English);
        let expected = format!("{}{}", "x".repeat(COMMIT_DIFF_BUDGET), TRUNCATION_MARKER);
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains("TAIL"));
    }

    #[test]
    fn test_chinese_language_rule() {
        let prompt = build_commit_message_prompt("diff", Language::Chinese);
        assert!(prompt.contains("Simplified Chinese"));
    }
}
