//! Decoding of the two source datasets from delimited text.
//!
//! Both files carry a header row. Columns are looked up by header name,
//! missing columns decode as empty strings and blank lines are skipped. The
//! results file uses the question-style headers of the review form.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::error::{ImportError, ImportResult};
use crate::models::{ExpertOpinion, Task};

/// Header names of the raw task file.
#[allow(missing_docs)]
pub mod task_columns {
    pub const TASK_ID: &str = "task_id";
    pub const PROMPT: &str = "prompt";
    pub const LAST_HUMAN_MESSAGE: &str = "last_human_message";
    pub const RESPONSE_A: &str = "response_A";
    pub const RESPONSE_B: &str = "response_B";
    pub const PREFERENCE: [&str; 2] = ["Which do you prefer (Response A or Response B)", "preference"];
    pub const REASONING: [&str; 2] = ["Why do you prefer the one that you do?", "reasoning"];
    pub const STRENGTH: [&str; 2] = [
        "On a scale from 0-3 (inclusive) how strongly do you prefer the response that you chose?",
        "strength",
    ];
}

/// Header names of the expert results file.
#[allow(missing_docs)]
pub mod result_columns {
    pub const TASK_ID: &str = "task ID";
    pub const PROGRAMMING_LANGUAGE: &str = "Programming Language";
    pub const TOPIC: &str = "topic";
    pub const CATEGORY: &str = "category";
    pub const TASK_PROGRESS: &str = "Task Progress";
    pub const PREFERENCE_CHOOSER: &str = "Assigned Preference Chooser";
    pub const PREFERENCE_CHOICE: &str = "Preference Choice";
    pub const PREFERENCE_STRENGTH: &str = "Preference Strength (0-3 scale, 0 being nearly identical with low strength of preference and 3 being highly different and a very strong preference for your choice)";
    pub const PREFERENCE_JUSTIFICATION: &str = "3+ Sentence Preference Justification (3+ sentences covering the difference in relevance, accuracy, clarity, etc. )";
    pub const RESPONSE_A_IMAGE: &str = "INSERT RESPONSE A SUPPORTING IMAGE HERE (if you have more than one image, create a google drive with them all and share the link, make sure to change the sharing permissions so all can view)";
    pub const RESPONSE_B_IMAGE: &str = "INSERT RESPONSE B SUPPORTING IMAGE HERE  (if you have more than one image, create a google drive with them all and share the link, make sure to change the sharing permissions so all can view)";
    pub const ASSIGNED_REVIEWER: &str = "Assigned Reviewer";
    pub const REVIEW: &str = "Review";
    pub const REVIEW_JUSTIFICATION: &str = "Justification for Review (Why do you agree or disagree with their preference choice in 1-3 sentences?)";
}

/// Header-name lookup for one decoded row.
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn get(&self, header: &str) -> String {
        self.columns
            .get(header)
            .and_then(|&position| self.record.get(position))
            .unwrap_or_default()
            .to_string()
    }

    fn first_of(&self, headers: &[&str]) -> String {
        headers
            .iter()
            .find(|header| self.columns.contains_key(**header))
            .map(|header| self.get(header))
            .unwrap_or_default()
    }
}

fn decode<R, T, F>(reader: R, dataset: &str, required: &str, mut map_row: F) -> ImportResult<Vec<T>>
where
    R: Read,
    F: FnMut(&Row<'_>) -> Option<T>,
{
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(position, header)| (header.trim().to_string(), position))
        .collect();

    if !columns.contains_key(required) {
        return Err(ImportError::MissingColumn {
            dataset: dataset.to_string(),
            column: required.to_string(),
        });
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        match map_row(&Row {
            columns: &columns,
            record: &record,
        }) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(dataset, skipped, "Dropped rows without a task id");
    }
    info!(dataset, rows = rows.len(), "Decoded dataset");
    Ok(rows)
}

/// Decode the raw task file. Rows with an empty `task_id` are dropped.
pub fn read_tasks<R: Read>(reader: R) -> ImportResult<Vec<Task>> {
    use task_columns::*;

    decode(reader, "Tasks", TASK_ID, |row| {
        let task_id = row.get(TASK_ID);
        if task_id.trim().is_empty() {
            return None;
        }
        Some(Task {
            task_id,
            prompt: row.get(PROMPT),
            last_human_message: row.get(LAST_HUMAN_MESSAGE),
            response_a: row.get(RESPONSE_A),
            response_b: row.get(RESPONSE_B),
            preference: row.first_of(&PREFERENCE),
            reasoning: row.first_of(&REASONING),
            strength: row.first_of(&STRENGTH),
        })
    })
}

/// Decode the expert results file.
pub fn read_expert_opinions<R: Read>(reader: R) -> ImportResult<Vec<ExpertOpinion>> {
    use result_columns::*;

    decode(reader, "Results", TASK_ID, |row| {
        Some(ExpertOpinion {
            task_id: row.get(TASK_ID),
            programming_language: row.get(PROGRAMMING_LANGUAGE),
            topic: row.get(TOPIC),
            category: row.get(CATEGORY),
            task_progress: row.get(TASK_PROGRESS),
            assigned_preference_chooser: row.get(PREFERENCE_CHOOSER),
            preference_choice: row.get(PREFERENCE_CHOICE),
            preference_strength: row.get(PREFERENCE_STRENGTH),
            preference_justification: row.get(PREFERENCE_JUSTIFICATION),
            response_a_image: row.get(RESPONSE_A_IMAGE),
            response_b_image: row.get(RESPONSE_B_IMAGE),
            assigned_reviewer: row.get(ASSIGNED_REVIEWER),
            review: row.get(REVIEW),
            justification_for_review: row.get(REVIEW_JUSTIFICATION),
        })
    })
}

fn open(path: &Path) -> ImportResult<File> {
    File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode the raw task file at `path`.
pub fn load_tasks_file(path: impl AsRef<Path>) -> ImportResult<Vec<Task>> {
    read_tasks(open(path.as_ref())?)
}

/// Decode the expert results file at `path`.
pub fn load_expert_opinions_file(path: impl AsRef<Path>) -> ImportResult<Vec<ExpertOpinion>> {
    read_expert_opinions(open(path.as_ref())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_tasks_maps_columns() {
        let data = "\
task_id,prompt,last_human_message,response_A,response_B,Which do you prefer (Response A or Response B)
t-1,\"Explain, briefly\",thanks,\"Line one
line two\",B text,A
";
        let tasks = read_tasks(data.as_bytes()).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_id, "t-1");
        assert_eq!(tasks[0].prompt, "Explain, briefly");
        assert_eq!(tasks[0].response_a, "Line one\nline two");
        assert_eq!(tasks[0].response_b, "B text");
        assert_eq!(tasks[0].preference, "A");
        assert_eq!(tasks[0].reasoning, "");
    }

    #[test]
    fn test_read_tasks_plain_legacy_headers() {
        let data = "task_id,preference,reasoning,strength\nt-1,B,clearer,2\n";
        let tasks = read_tasks(data.as_bytes()).unwrap();

        assert_eq!(tasks[0].preference, "B");
        assert_eq!(tasks[0].reasoning, "clearer");
        assert_eq!(tasks[0].strength, "2");
    }

    #[test]
    fn test_read_tasks_skips_blank_and_idless_rows() {
        let data = "task_id,prompt\nt-1,first\n\n,orphan\n,\nt-2,second\n";
        let tasks = read_tasks(data.as_bytes()).unwrap();

        let ids: Vec<&str> = tasks.iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-2"]);
    }

    #[test]
    fn test_read_tasks_short_rows_default_to_empty() {
        let data = "task_id,prompt,response_A\nt-1\n";
        let tasks = read_tasks(data.as_bytes()).unwrap();

        assert_eq!(tasks, vec![Task::new("t-1")]);
    }

    #[test]
    fn test_read_tasks_requires_task_id_column() {
        let data = "id,prompt\nt-1,hello\n";
        let err = read_tasks(data.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            ImportError::MissingColumn { ref column, .. } if column == "task_id"
        ));
    }

    #[test]
    fn test_read_expert_opinions_maps_form_headers() {
        let data = format!(
            "task ID,category,Task Progress,Assigned Preference Chooser,Review,\"{}\"\n\
             t-1,Debugging,Completed,alice,Agree,Choice is well argued\n",
            result_columns::REVIEW_JUSTIFICATION
        );
        let opinions = read_expert_opinions(data.as_bytes()).unwrap();

        assert_eq!(opinions.len(), 1);
        let opinion = &opinions[0];
        assert_eq!(opinion.task_id, "t-1");
        assert_eq!(opinion.category, "Debugging");
        assert_eq!(opinion.task_progress, "Completed");
        assert_eq!(opinion.assigned_preference_chooser, "alice");
        assert_eq!(opinion.review, "Agree");
        assert_eq!(opinion.justification_for_review, "Choice is well argued");
        assert_eq!(opinion.preference_strength, "");
    }

    #[test]
    fn test_read_expert_opinions_requires_task_id_column() {
        let data = "task_id,Review\nt-1,Agree\n";
        let err = read_expert_opinions(data.as_bytes()).unwrap_err();

        assert!(err.to_string().contains("'task ID'"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_tasks_file("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
