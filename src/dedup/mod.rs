//! Duplicate detection over raw task submissions.
//!
//! - [`content_key`]: derive the identity key of a task from its content
//! - [`grouping`]: group tasks by key and attach duplicate cross-references

pub mod content_key;
pub mod grouping;

pub use content_key::{content_key, normalize_text, MIN_FIELD_LENGTH};
pub use grouping::{group_by_content_key, identify_duplicate_tasks};
