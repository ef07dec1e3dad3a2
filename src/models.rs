//! Domain records for pairwise response review.
//!
//! A [`Task`] is one row of the raw task file, an [`ExpertOpinion`] is one row
//! of the expert results file. Both are joined by `task_id` and enriched into
//! [`TaskWithDuplicates`] by the duplicate grouping pass.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One reviewable unit of work: a prompt and two candidate responses.
///
/// Content fields are free text and may be empty. A task is never mutated
/// after it is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier of the raw source row.
    pub task_id: String,
    /// Conversation prompt shown to both models.
    #[serde(default)]
    pub prompt: String,
    /// Final human turn of the conversation.
    #[serde(default)]
    pub last_human_message: String,
    /// First candidate response.
    #[serde(default, rename = "response_A")]
    pub response_a: String,
    /// Second candidate response.
    #[serde(default, rename = "response_B")]
    pub response_b: String,
    /// Legacy single-reviewer preference.
    #[serde(default)]
    pub preference: String,
    /// Legacy single-reviewer reasoning.
    #[serde(default)]
    pub reasoning: String,
    /// Legacy single-reviewer preference strength.
    #[serde(default)]
    pub strength: String,
}

/// Structured expert annotation of a [`Task`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertOpinion {
    /// Identifier of the annotated task.
    pub task_id: String,
    /// Programming language the task is about.
    #[serde(default)]
    pub programming_language: String,
    /// Free-text topic.
    #[serde(default)]
    pub topic: String,
    /// Task category used for expert routing.
    #[serde(default)]
    pub category: String,
    /// Progress label, compared case-insensitively (e.g. "Completed", "Revised").
    #[serde(default)]
    pub task_progress: String,
    /// Evaluator that made the preference choice.
    #[serde(default)]
    pub assigned_preference_chooser: String,
    /// Which response was preferred.
    #[serde(default)]
    pub preference_choice: String,
    /// Preference strength on the 0-3 scale.
    #[serde(default)]
    pub preference_strength: String,
    /// Evaluator's justification for the choice.
    #[serde(default)]
    pub preference_justification: String,
    /// Supporting image link for response A.
    #[serde(default)]
    pub response_a_image: String,
    /// Supporting image link for response B.
    #[serde(default)]
    pub response_b_image: String,
    /// Reviewer checking the evaluator's choice.
    #[serde(default)]
    pub assigned_reviewer: String,
    /// Reviewer verdict, free text.
    #[serde(default)]
    pub review: String,
    /// Reviewer's justification for the verdict.
    #[serde(default)]
    pub justification_for_review: String,
}

/// Reference to another task carrying the same content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateTask {
    /// Identifier of the duplicate task.
    pub task_id: String,
    /// Expert opinion attached to the duplicate.
    pub expert_opinion: Arc<ExpertOpinion>,
    /// The duplicate's raw task record.
    pub original_task: Arc<Task>,
}

/// A task joined with its expert opinion and its equivalence-class siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskWithDuplicates {
    /// The raw task.
    #[serde(flatten)]
    pub task: Arc<Task>,
    /// Expert opinion for this task, if the results file has one.
    pub expert_opinion: Option<Arc<ExpertOpinion>>,
    /// Other tasks with the same content key that have an expert opinion.
    pub duplicates: Vec<DuplicateTask>,
}

impl Task {
    /// Create a task with only an identifier set.
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }

    /// Set the prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the last human message.
    pub fn with_last_human_message(mut self, message: impl Into<String>) -> Self {
        self.last_human_message = message.into();
        self
    }

    /// Set both candidate responses.
    pub fn with_responses(mut self, response_a: impl Into<String>, response_b: impl Into<String>) -> Self {
        self.response_a = response_a.into();
        self.response_b = response_b.into();
        self
    }

    /// Set the legacy single-reviewer fields.
    pub fn with_legacy_review(
        mut self,
        preference: impl Into<String>,
        reasoning: impl Into<String>,
        strength: impl Into<String>,
    ) -> Self {
        self.preference = preference.into();
        self.reasoning = reasoning.into();
        self.strength = strength.into();
        self
    }
}

impl ExpertOpinion {
    /// Create an opinion for the given task with every other field empty.
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }

    /// Set the progress label.
    pub fn with_progress(mut self, progress: impl Into<String>) -> Self {
        self.task_progress = progress.into();
        self
    }

    /// Set the reviewer verdict.
    pub fn with_review(mut self, review: impl Into<String>) -> Self {
        self.review = review.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the evaluator who made the preference choice.
    pub fn with_chooser(mut self, chooser: impl Into<String>) -> Self {
        self.assigned_preference_chooser = chooser.into();
        self
    }

    /// Set the reviewer.
    pub fn with_reviewer(mut self, reviewer: impl Into<String>) -> Self {
        self.assigned_reviewer = reviewer.into();
        self
    }
}

impl TaskWithDuplicates {
    /// Task identifier.
    pub fn task_id(&self) -> &str {
        &self.task.task_id
    }

    /// Expert opinion, if one was joined.
    pub fn expert_opinion(&self) -> Option<&ExpertOpinion> {
        self.expert_opinion.as_deref()
    }

    /// Whether any other submission carries the same content.
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

impl Deref for TaskWithDuplicates {
    type Target = Task;

    fn deref(&self) -> &Task {
        &self.task
    }
}
