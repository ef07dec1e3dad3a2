//! Expert assignment analysis.
//!
//! Routes open work to evaluators by category: an expert is offered the
//! unassigned, unfinished tasks in categories where they already have fully
//! completed work.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::completion::is_task_fully_completed;
use crate::index::JoinIndex;
use crate::models::TaskWithDuplicates;

/// Category label for completed work without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Number of tasks in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Category label as written in the results file.
    pub category: String,
    /// Number of tasks carrying it.
    pub count: usize,
}

/// Completed and available work for one expert.
#[derive(Debug, Clone, Serialize)]
pub struct ExpertStats<'a> {
    /// Expert name as it appears in `assigned_preference_chooser`.
    pub name: String,
    /// Fully completed tasks of this expert, grouped by category.
    pub completed_by_category: BTreeMap<String, Vec<&'a TaskWithDuplicates>>,
    /// Unassigned, unfinished tasks in the expert's categories.
    pub available: Vec<&'a TaskWithDuplicates>,
}

impl ExpertStats<'_> {
    /// Total number of completed tasks across categories.
    pub fn completed_count(&self) -> usize {
        self.completed_by_category.values().map(Vec::len).sum()
    }
}

/// Distinct evaluators across all tasks, sorted.
pub fn list_experts(tasks: &[TaskWithDuplicates]) -> Vec<String> {
    tasks
        .iter()
        .filter_map(|task| task.expert_opinion())
        .map(|opinion| opinion.assigned_preference_chooser.as_str())
        .filter(|chooser| !chooser.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Task counts per category, most populated first.
pub fn category_counts<'a, I>(tasks: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a TaskWithDuplicates>,
{
    let mut order: Vec<&'a str> = Vec::new();
    let mut counts: HashMap<&'a str, usize> = HashMap::new();

    for opinion in tasks.into_iter().filter_map(|task| task.expert_opinion()) {
        let category = opinion.category.as_str();
        if category.is_empty() {
            continue;
        }
        let count = counts.entry(category).or_insert(0);
        if *count == 0 {
            order.push(category);
        }
        *count += 1;
    }

    let mut result: Vec<CategoryCount> = order
        .into_iter()
        .map(|category| CategoryCount {
            category: category.to_string(),
            count: counts[category],
        })
        .collect();
    // Stable sort keeps first-seen order among equal counts.
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

/// Completed work of `expert` across `all_tasks`, and the open work in
/// `filtered_tasks` that falls into the same categories.
pub fn expert_stats<'a, I>(
    expert: &str,
    all_tasks: &'a [TaskWithDuplicates],
    filtered_tasks: I,
    index: &JoinIndex,
) -> ExpertStats<'a>
where
    I: IntoIterator<Item = &'a TaskWithDuplicates>,
{
    let is_completed =
        |task: &TaskWithDuplicates| index.task(task.task_id()).is_some_and(is_task_fully_completed);

    let mut completed_by_category: BTreeMap<String, Vec<&'a TaskWithDuplicates>> = BTreeMap::new();
    let mut expert_categories: HashSet<&str> = HashSet::new();

    for task in all_tasks {
        let Some(opinion) = task.expert_opinion() else {
            continue;
        };
        if opinion.assigned_preference_chooser != expert || !is_completed(task) {
            continue;
        }
        let category = if opinion.category.is_empty() {
            UNCATEGORIZED
        } else {
            opinion.category.as_str()
        };
        expert_categories.insert(category);
        completed_by_category
            .entry(category.to_string())
            .or_default()
            .push(task);
    }

    let available = filtered_tasks
        .into_iter()
        .filter(|task| {
            task.expert_opinion().is_some_and(|opinion| {
                !opinion.category.is_empty()
                    && expert_categories.contains(opinion.category.as_str())
                    && opinion.assigned_preference_chooser.trim().is_empty()
            })
        })
        .filter(|task| !is_completed(*task))
        .collect();

    ExpertStats {
        name: expert.to_string(),
        completed_by_category,
        available,
    }
}
