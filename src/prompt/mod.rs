//! Prompt construction for the three generation intents.
//!
//! Every builder is a pure function of its inputs. Oversized diffs are clipped
//! with [`truncate_with_marker`] so the model always sees that text is missing.

pub mod change;
pub mod commit;
pub mod summary;

pub use change::{CHANGE_SUMMARY_DIFF_BUDGET, build_change_summary_prompt};
pub use commit::{COMMIT_DIFF_BUDGET, COMMIT_TYPES, build_commit_message_prompt};
pub use summary::{SUMMARY_FILE_CAP, build_summary_prompt};

use crate::config::Language;

/// Appended to any text clipped by [`truncate_with_marker`].
pub const TRUNCATION_MARKER: &str = "\n... (diff truncated)";

/// Keep the first `budget` characters of `text` and append the marker.
///
/// Text within budget is returned unchanged. Counting is by `char`, so
/// multi-byte content is never split.
pub fn truncate_with_marker(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((cut, _)) => {
            let mut clipped = String::with_capacity(cut + TRUNCATION_MARKER.len());
            clipped.push_str(&text[..cut]);
            clipped.push_str(TRUNCATION_MARKER);
            clipped
        }
        None => text.to_string(),
    }
}

/// Join up to `cap` file names, followed by an overflow counter when clipped.
///
/// The counter states how many names were left out.
pub fn format_file_list(files: &[String], cap: usize, language: Language) -> String {
    let shown = files.iter().take(cap).map(String::as_str).collect::<Vec<_>>().join(", ");
    let remaining = files.len().saturating_sub(cap);
    if remaining == 0 {
        return shown;
    }
    match language {
        Language::Chinese => format!("{} 等另外 {} 个文件", shown, remaining),
        Language::English => format!("{} and {} more", shown, remaining),
    }
}
