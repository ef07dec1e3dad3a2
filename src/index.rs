//! Task/expert join index.
//!
//! Built once per loaded dataset pair and never mutated afterwards. A new
//! dataset produces a new index.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::dedup::grouping::group_duplicates;
use crate::models::{ExpertOpinion, Task, TaskWithDuplicates};

/// Expert opinions keyed by task id. Later rows win on repeated ids.
pub type ExpertMap = HashMap<String, Arc<ExpertOpinion>>;

/// Build the expert lookup for a results dataset.
pub fn expert_map(expert_opinions: &[ExpertOpinion]) -> ExpertMap {
    expert_opinions
        .iter()
        .map(|opinion| (opinion.task_id.clone(), Arc::new(opinion.clone())))
        .collect()
}

/// A joined task together with its position in dataset order.
#[derive(Debug, Clone, Copy)]
pub struct IndexedTask<'a> {
    /// The joined task.
    pub task: &'a TaskWithDuplicates,
    /// Zero-based position in the enhanced task list.
    pub index: usize,
}

/// Immutable lookup structure over one dataset pair.
#[derive(Debug, Clone, Default)]
pub struct JoinIndex {
    experts: ExpertMap,
    tasks: Vec<TaskWithDuplicates>,
    positions: HashMap<String, usize>,
}

impl JoinIndex {
    /// Join both datasets, run duplicate grouping and index the result.
    pub fn build(tasks: &[Task], expert_opinions: &[ExpertOpinion]) -> Self {
        let experts = expert_map(expert_opinions);
        let enhanced = group_duplicates(tasks, &experts);
        Self::from_parts(experts, enhanced)
    }

    /// Index an already enriched task list.
    pub fn from_enhanced(enhanced: Vec<TaskWithDuplicates>, expert_opinions: &[ExpertOpinion]) -> Self {
        Self::from_parts(expert_map(expert_opinions), enhanced)
    }

    fn from_parts(experts: ExpertMap, tasks: Vec<TaskWithDuplicates>) -> Self {
        let positions = tasks
            .iter()
            .enumerate()
            .map(|(index, task)| (task.task_id().to_string(), index))
            .collect::<HashMap<_, _>>();

        debug!(
            tasks = tasks.len(),
            distinct_ids = positions.len(),
            expert_opinions = experts.len(),
            "Join index built"
        );

        Self {
            experts,
            tasks,
            positions,
        }
    }

    /// Expert opinion for a task id.
    pub fn expert_opinion(&self, task_id: &str) -> Option<&ExpertOpinion> {
        self.experts.get(task_id).map(Arc::as_ref)
    }

    /// Joined task and its position for a task id. Repeated ids resolve to
    /// their last occurrence.
    pub fn get(&self, task_id: &str) -> Option<IndexedTask<'_>> {
        let &index = self.positions.get(task_id)?;
        self.tasks.get(index).map(|task| IndexedTask { task, index })
    }

    /// Joined task for a task id.
    pub fn task(&self, task_id: &str) -> Option<&TaskWithDuplicates> {
        self.get(task_id).map(|entry| entry.task)
    }

    /// Whether a task id is known.
    pub fn contains(&self, task_id: &str) -> bool {
        self.positions.contains_key(task_id)
    }

    /// All joined tasks in dataset order.
    pub fn tasks(&self) -> &[TaskWithDuplicates] {
        &self.tasks
    }

    /// Number of joined tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the index holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<Task>, Vec<ExpertOpinion>) {
        let tasks = vec![
            Task::new("t-1").with_prompt("Explain ownership in Rust please"),
            Task::new("t-2").with_prompt("Explain ownership in Rust please"),
            Task::new("t-3").with_prompt("Something else entirely here"),
        ];
        let opinions = vec![
            ExpertOpinion::new("t-1").with_category("Rust"),
            ExpertOpinion::new("t-3").with_category("General"),
        ];
        (tasks, opinions)
    }

    #[test]
    fn test_build_indexes_positions() {
        let (tasks, opinions) = sample();
        let index = JoinIndex::build(&tasks, &opinions);

        assert_eq!(index.len(), 3);
        let entry = index.get("t-2").unwrap();
        assert_eq!(entry.index, 1);
        assert_eq!(entry.task.task_id(), "t-2");
        assert_eq!(entry.task.duplicates.len(), 1);
        assert!(index.get("missing").is_none());
        assert!(index.contains("t-3"));
    }

    #[test]
    fn test_expert_lookup() {
        let (tasks, opinions) = sample();
        let index = JoinIndex::build(&tasks, &opinions);

        assert_eq!(index.expert_opinion("t-1").unwrap().category, "Rust");
        assert!(index.expert_opinion("t-2").is_none());
        assert!(index.task("t-2").unwrap().expert_opinion.is_none());
    }

    #[test]
    fn test_repeated_ids_resolve_to_last_row() {
        let tasks = vec![Task::new("dup"), Task::new("other"), Task::new("dup")];
        let opinions = vec![
            ExpertOpinion::new("dup").with_category("first"),
            ExpertOpinion::new("dup").with_category("second"),
        ];
        let index = JoinIndex::build(&tasks, &opinions);

        assert_eq!(index.get("dup").unwrap().index, 2);
        assert_eq!(index.expert_opinion("dup").unwrap().category, "second");
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_empty_index() {
        let index = JoinIndex::default();
        assert!(index.is_empty());
        assert!(index.tasks().is_empty());
        assert!(index.get("t-1").is_none());
    }

    #[test]
    fn test_from_enhanced_matches_build() {
        let (tasks, opinions) = sample();
        let enhanced = crate::dedup::identify_duplicate_tasks(&tasks, &opinions);
        let index = JoinIndex::from_enhanced(enhanced, &opinions);

        assert_eq!(index.tasks(), JoinIndex::build(&tasks, &opinions).tasks());
    }
}
