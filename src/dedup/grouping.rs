//! Duplicate grouping: partition tasks by content key and cross-reference
//! every member of a class with its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::content_key::content_key;
use crate::index::{expert_map, ExpertMap};
use crate::models::{DuplicateTask, ExpertOpinion, Task, TaskWithDuplicates};

/// Enrich every task with its expert opinion and its duplicates.
///
/// The output has exactly one entry per input task, in input order. Siblings
/// without an expert opinion are left out of `duplicates` but still appear as
/// their own entries.
pub fn identify_duplicate_tasks(
    tasks: &[Task],
    expert_opinions: &[ExpertOpinion],
) -> Vec<TaskWithDuplicates> {
    let experts = expert_map(expert_opinions);
    group_duplicates(tasks, &experts)
}

/// Grouping pass over an already built expert lookup.
pub(crate) fn group_duplicates(tasks: &[Task], experts: &ExpertMap) -> Vec<TaskWithDuplicates> {
    let tasks: Vec<Arc<Task>> = tasks.iter().cloned().map(Arc::new).collect();
    let keys: Vec<String> = tasks.iter().map(|task| content_key(task)).collect();

    let mut classes: HashMap<&str, Vec<usize>> = HashMap::new();
    for (position, key) in keys.iter().enumerate() {
        classes.entry(key.as_str()).or_default().push(position);
    }

    let enhanced: Vec<TaskWithDuplicates> = tasks
        .iter()
        .zip(&keys)
        .map(|(task, key)| {
            let members = classes.get(key.as_str()).map(Vec::as_slice).unwrap_or_default();
            let duplicates = members
                .iter()
                .map(|&position| &tasks[position])
                .filter(|other| other.task_id != task.task_id)
                .filter_map(|other| {
                    experts.get(&other.task_id).map(|opinion| DuplicateTask {
                        task_id: other.task_id.clone(),
                        expert_opinion: Arc::clone(opinion),
                        original_task: Arc::clone(other),
                    })
                })
                .collect();

            TaskWithDuplicates {
                task: Arc::clone(task),
                expert_opinion: experts.get(&task.task_id).cloned(),
                duplicates,
            }
        })
        .collect();

    debug!(
        tasks = enhanced.len(),
        classes = classes.len(),
        with_duplicates = enhanced.iter().filter(|t| t.has_duplicates()).count(),
        "Duplicate grouping complete"
    );

    enhanced
}

/// Partition tasks into content-key equivalence classes.
///
/// Classes are returned in order of first appearance and members keep their
/// input order.
pub fn group_by_content_key<'a, I>(tasks: I) -> Vec<Vec<&'a Task>>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut order: Vec<String> = Vec::new();
    let mut classes: HashMap<String, Vec<&'a Task>> = HashMap::new();

    for task in tasks {
        let key = content_key(task);
        match classes.get_mut(&key) {
            Some(members) => members.push(task),
            None => {
                order.push(key.clone());
                classes.insert(key, vec![task]);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| classes.remove(&key))
        .collect()
}
