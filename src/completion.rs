//! Completion classification of a single task.
//!
//! A task is complete when its evaluator marked it "completed" or "revised",
//! and fully completed once a reviewer's verdict signals agreement.

use serde::{Deserialize, Serialize};

use crate::models::{ExpertOpinion, TaskWithDuplicates};

/// Progress labels that mark the evaluator's work as done.
pub const COMPLETE_PROGRESS_LABELS: [&str; 2] = ["completed", "revised"];

/// Review state of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    /// Not marked complete, or no expert opinion at all.
    #[default]
    Incomplete,
    /// Marked complete but without a reviewer agreement.
    ReadyForReview,
    /// Marked complete and agreed by a reviewer.
    FullyCompleted,
}

impl std::fmt::Display for CompletionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionState::Incomplete => write!(f, "incomplete"),
            CompletionState::ReadyForReview => write!(f, "ready_for_review"),
            CompletionState::FullyCompleted => write!(f, "fully_completed"),
        }
    }
}

impl std::str::FromStr for CompletionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "incomplete" => Ok(CompletionState::Incomplete),
            "ready_for_review" => Ok(CompletionState::ReadyForReview),
            "fully_completed" => Ok(CompletionState::FullyCompleted),
            _ => Err(format!("Unknown completion state: {}", s)),
        }
    }
}

/// Whether a progress label marks the evaluator's work as done.
pub fn is_progress_complete(task_progress: &str) -> bool {
    let progress = task_progress.trim().to_lowercase();
    COMPLETE_PROGRESS_LABELS.contains(&progress.as_str())
}

/// Whether a review verdict signals agreement.
///
/// This is a plain case-insensitive substring test for "agree", so
/// "I disagree" also counts as agreement. Every agreement check goes
/// through here.
pub fn has_agreement(review: &str) -> bool {
    review.to_lowercase().contains("agree")
}

/// Classify an expert opinion. A missing opinion is always incomplete.
pub fn classify(opinion: Option<&ExpertOpinion>) -> CompletionState {
    let Some(opinion) = opinion else {
        return CompletionState::Incomplete;
    };

    match (
        is_progress_complete(&opinion.task_progress),
        has_agreement(&opinion.review),
    ) {
        (true, true) => CompletionState::FullyCompleted,
        (true, false) => CompletionState::ReadyForReview,
        (false, _) => CompletionState::Incomplete,
    }
}

/// Classify a joined task by its own expert opinion.
pub fn task_state(task: &TaskWithDuplicates) -> CompletionState {
    classify(task.expert_opinion())
}

/// Complete but not yet agreed by a reviewer.
pub fn is_task_ready_for_review(task: &TaskWithDuplicates) -> bool {
    task_state(task) == CompletionState::ReadyForReview
}

/// Complete and agreed by a reviewer.
pub fn is_task_fully_completed(task: &TaskWithDuplicates) -> bool {
    task_state(task) == CompletionState::FullyCompleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use std::sync::Arc;

    fn joined(opinion: Option<ExpertOpinion>) -> TaskWithDuplicates {
        TaskWithDuplicates {
            task: Arc::new(Task::new("t-1")),
            expert_opinion: opinion.map(Arc::new),
            duplicates: vec![],
        }
    }

    fn opinion(progress: &str, review: &str) -> ExpertOpinion {
        ExpertOpinion::new("t-1").with_progress(progress).with_review(review)
    }

    #[test]
    fn test_progress_labels_are_case_insensitive_and_trimmed() {
        assert!(is_progress_complete("completed"));
        assert!(is_progress_complete("  Completed "));
        assert!(is_progress_complete("REVISED"));
        assert!(!is_progress_complete("in progress"));
        assert!(!is_progress_complete("complete"));
        assert!(!is_progress_complete(""));
    }

    #[test]
    fn test_has_agreement() {
        assert!(has_agreement("Agree"));
        assert!(has_agreement("I agree, good justification"));
        assert!(!has_agreement(""));
        assert!(!has_agreement("Needs changes"));
    }

    #[test]
    fn test_disagree_counts_as_agreement() {
        // Literal substring match: "disagree" contains "agree".
        assert!(has_agreement("I disagree with this choice"));
        assert_eq!(
            classify(Some(&opinion("completed", "I disagree with this choice"))),
            CompletionState::FullyCompleted
        );
    }

    #[test]
    fn test_classify_states() {
        assert_eq!(
            classify(Some(&opinion("completed", "agree, good"))),
            CompletionState::FullyCompleted
        );
        assert_eq!(
            classify(Some(&opinion("Revised", ""))),
            CompletionState::ReadyForReview
        );
        assert_eq!(
            classify(Some(&opinion("in progress", "agree"))),
            CompletionState::Incomplete
        );
        assert_eq!(classify(None), CompletionState::Incomplete);
    }

    #[test]
    fn test_classifier_partition() {
        let progresses = ["completed", "revised", "pending", ""];
        let reviews = ["agree", "Disagree", "looks wrong", ""];
        for progress in progresses {
            for review in reviews {
                let task = joined(Some(opinion(progress, review)));
                let hits = [
                    is_task_fully_completed(&task),
                    is_task_ready_for_review(&task),
                    task_state(&task) == CompletionState::Incomplete,
                ];
                assert_eq!(hits.iter().filter(|hit| **hit).count(), 1, "{progress}/{review}");
            }
        }
    }

    #[test]
    fn test_task_without_opinion_is_incomplete() {
        let task = joined(None);
        assert!(!is_task_ready_for_review(&task));
        assert!(!is_task_fully_completed(&task));
        assert_eq!(task_state(&task), CompletionState::Incomplete);
    }

    #[test]
    fn test_completion_state_round_trip() {
        for state in [
            CompletionState::Incomplete,
            CompletionState::ReadyForReview,
            CompletionState::FullyCompleted,
        ] {
            assert_eq!(state.to_string().parse::<CompletionState>(), Ok(state));
        }
        assert!("done".parse::<CompletionState>().is_err());
    }
}
