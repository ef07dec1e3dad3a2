//! Batch aggregation.
//!
//! A batch is a task together with everything sharing its content key. Review
//! progress is tracked per batch rather than per task: one accepted review
//! settles the whole batch for the active review queue.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::completion::{is_task_fully_completed, task_state, CompletionState};
use crate::dedup::group_by_content_key;
use crate::index::JoinIndex;
use crate::models::TaskWithDuplicates;

/// Aggregate completion statistics over all batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    /// Number of batches visited.
    pub total_batches: usize,
    /// Batches with at least one fully completed member.
    pub completed_batches: usize,
    /// `completed_batches / total_batches * 100`, one decimal place.
    pub completion_percentage: f64,
    /// Every task id covered by the pass.
    pub processed_task_ids: HashSet<String>,
}

#[derive(Default)]
struct StatsTally {
    visited: HashSet<String>,
    total: usize,
    completed: usize,
}

impl StatsTally {
    fn visit(mut self, task: &TaskWithDuplicates, index: &JoinIndex) -> Self {
        if self.visited.contains(task.task_id()) {
            return self;
        }

        let batch: Vec<&str> = std::iter::once(task.task_id())
            .chain(task.duplicates.iter().map(|d| d.task_id.as_str()))
            .collect();

        let batch_completed = batch
            .iter()
            .any(|id| index.task(id).is_some_and(is_task_fully_completed));

        self.total += 1;
        if batch_completed {
            self.completed += 1;
        }
        self.visited.extend(batch.into_iter().map(str::to_string));
        self
    }
}

/// Count batches and completed batches in one pass over the tasks.
///
/// Visiting a task marks its whole batch (itself and its listed duplicates)
/// as processed, so later members of the same batch are skipped.
///
/// The totals depend on task order when a batch has members without an
/// expert opinion. Those members are not listed as duplicates, so visiting a
/// sibling first does not cover them and they are counted as a batch of
/// their own; visiting them first covers the whole class in one batch.
pub fn calculate_batch_stats(tasks: &[TaskWithDuplicates], index: &JoinIndex) -> BatchStats {
    let tally = tasks
        .iter()
        .fold(StatsTally::default(), |tally, task| tally.visit(task, index));

    let completion_percentage = if tally.total == 0 {
        0.0
    } else {
        (tally.completed as f64 / tally.total as f64 * 1000.0).round() / 10.0
    };

    debug!(
        total_batches = tally.total,
        completed_batches = tally.completed,
        completion_percentage,
        "Batch statistics computed"
    );

    BatchStats {
        total_batches: tally.total,
        completed_batches: tally.completed,
        completion_percentage,
        processed_task_ids: tally.visited,
    }
}

/// One content-key equivalence class with the state of each member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Member task ids in dataset order.
    pub task_ids: Vec<String>,
    /// Completion state of each member, parallel to `task_ids`.
    pub states: Vec<CompletionState>,
}

impl Batch {
    /// At least one member is fully completed.
    pub fn any_completed(&self) -> bool {
        self.states.contains(&CompletionState::FullyCompleted)
    }

    /// Every member is fully completed.
    pub fn all_completed(&self) -> bool {
        self.states
            .iter()
            .all(|state| *state == CompletionState::FullyCompleted)
    }

    /// At least one member is waiting for review.
    pub fn any_ready_for_review(&self) -> bool {
        self.states.contains(&CompletionState::ReadyForReview)
    }
}

/// Group all tasks into batches, resolving member states through the index.
pub fn batches(tasks: &[TaskWithDuplicates], index: &JoinIndex) -> Vec<Batch> {
    group_by_content_key(tasks.iter().map(|task| task.task.as_ref()))
        .into_iter()
        .map(|members| {
            let task_ids: Vec<String> = members.iter().map(|t| t.task_id.clone()).collect();
            let states = task_ids
                .iter()
                .map(|id| index.task(id).map(task_state).unwrap_or_default())
                .collect();
            Batch { task_ids, states }
        })
        .collect()
}

fn collect_members<F>(tasks: &[TaskWithDuplicates], index: &JoinIndex, include: F) -> HashSet<String>
where
    F: Fn(&Batch) -> bool,
{
    batches(tasks, index)
        .into_iter()
        .filter(|batch| include(batch))
        .flat_map(|batch| batch.task_ids)
        .collect()
}

/// Task ids of batches with a member awaiting review and no completed member.
pub fn get_batches_ready_for_review(tasks: &[TaskWithDuplicates], index: &JoinIndex) -> HashSet<String> {
    collect_members(tasks, index, |batch| {
        batch.any_ready_for_review() && !batch.any_completed()
    })
}

/// Task ids of batches that are not unanimously fully completed.
pub fn get_incomplete_batches(tasks: &[TaskWithDuplicates], index: &JoinIndex) -> HashSet<String> {
    collect_members(tasks, index, |batch| !batch.all_completed())
}

/// Task ids of batches with at least one fully completed member.
pub fn get_completed_batches(tasks: &[TaskWithDuplicates], index: &JoinIndex) -> HashSet<String> {
    collect_members(tasks, index, Batch::any_completed)
}

/// The standard review queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Queue {
    /// Batches awaiting a reviewer.
    Ready,
    /// Batches not yet unanimously completed.
    Incomplete,
    /// Batches with an accepted review.
    Completed,
}

impl Queue {
    /// Members of this queue.
    pub fn members(&self, tasks: &[TaskWithDuplicates], index: &JoinIndex) -> HashSet<String> {
        match self {
            Queue::Ready => get_batches_ready_for_review(tasks, index),
            Queue::Incomplete => get_incomplete_batches(tasks, index),
            Queue::Completed => get_completed_batches(tasks, index),
        }
    }
}

impl std::fmt::Display for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Queue::Ready => write!(f, "ready"),
            Queue::Incomplete => write!(f, "incomplete"),
            Queue::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for Queue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ready" | "ready_for_review" => Ok(Queue::Ready),
            "incomplete" => Ok(Queue::Incomplete),
            "completed" => Ok(Queue::Completed),
            _ => Err(format!("Unknown queue: {}", s)),
        }
    }
}
