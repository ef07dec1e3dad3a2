//! Content-key derivation for duplicate detection.
//!
//! Two tasks are duplicates when their keys are byte-equal. Matching is
//! exact after normalization: a single differing punctuation mark inside a
//! substantive field keeps two tasks apart.
//!
//! Field text is escaped before joining (backslash and `|` get a leading
//! backslash), and an unlabeled key that would start with `unique_` gets one
//! too. Labeled, unlabeled and unique keys therefore never coincide. Text
//! without those characters produces the plain `label:text|...` form.

use std::borrow::Cow;

use crate::models::Task;

/// Normalized fields must be longer than this many characters to count as
/// substantive and be included in the labeled key.
pub const MIN_FIELD_LENGTH: usize = 10;

/// Separator between key segments.
pub const KEY_DELIMITER: &str = "|";

/// Prefix of keys for tasks without any content.
pub const UNIQUE_KEY_PREFIX: &str = "unique_";

const ESCAPE: char = '\\';

/// Lower-case, collapse whitespace runs to one space, trim.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive the grouping key of a task.
///
/// Substantive fields are labeled (`prompt`, `human`, `responseA`,
/// `responseB`) so identical text in different roles never collides. When no
/// field is substantive, all non-empty fields are joined unlabeled. A task
/// with no content at all gets `unique_<task_id>` and never matches another.
pub fn content_key(task: &Task) -> String {
    let fields = [
        ("prompt", normalize_text(&task.prompt)),
        ("human", normalize_text(&task.last_human_message)),
        ("responseA", normalize_text(&task.response_a)),
        ("responseB", normalize_text(&task.response_b)),
    ];

    let labeled: Vec<String> = fields
        .iter()
        .filter(|(_, text)| text.chars().count() > MIN_FIELD_LENGTH)
        .map(|(label, text)| format!("{label}:{}", escape(text)))
        .collect();
    if !labeled.is_empty() {
        return labeled.join(KEY_DELIMITER);
    }

    let fallback: Vec<Cow<'_, str>> = fields
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(_, text)| escape(text))
        .collect();
    if !fallback.is_empty() {
        let key = fallback.join(KEY_DELIMITER);
        if key.starts_with(UNIQUE_KEY_PREFIX) {
            return format!("{ESCAPE}{key}");
        }
        return key;
    }

    format!("{UNIQUE_KEY_PREFIX}{}", task.task_id)
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains([ESCAPE, '|']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 4);
    for ch in text.chars() {
        if ch == ESCAPE || ch == '|' {
            escaped.push(ESCAPE);
        }
        escaped.push(ch);
    }
    Cow::Owned(escaped)
}
