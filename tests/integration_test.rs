//! End-to-end tests: delimited files through the workspace, storage and CLI.

use std::fs;
use std::path::PathBuf;

use micro_analysis::batch::Queue;
use micro_analysis::cli::{execute_command, Commands};
use micro_analysis::completion::{task_state, CompletionState};
use micro_analysis::config::DatabaseConfig;
use micro_analysis::error::{AppError, ImportError};
use micro_analysis::storage::{SqliteStorage, Storage};
use micro_analysis::workspace::ReviewWorkspace;
use tempfile::TempDir;

const TASKS: &str = "\
task_id,prompt,last_human_message,response_A,response_B
t-1,Explain recursion in simple terms with an example,,A function calling itself.,Nested dolls.
t-2,Explain  recursion in simple terms with an EXAMPLE,,A function calling itself.,Nested   dolls.
t-3,How do I reverse a string in Python?,,Use slicing: s[::-1],Use reversed() and join.
t-4,How do I reverse a string in Python?,,Use slicing: s[::-1],Use reversed() and join.

t-5,What does the borrow checker do?,,It enforces ownership rules.,It checks lifetimes.
";

const RESULTS: &str = "\
task ID,category,Task Progress,Assigned Preference Chooser,Assigned Reviewer,Review
t-1,Algorithms,Completed,alice,bob,Agree
t-2,Algorithms,Completed,carol,,
t-3,Strings,Completed,alice,,
t-4,Strings,in progress,dave,,
t-5,Ownership,Revised,carol,bob,agree with choice
";

struct Fixture {
    _dir: TempDir,
    tasks: PathBuf,
    results: PathBuf,
}

fn write_fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let tasks = dir.path().join("tasks.csv");
    let results = dir.path().join("results.csv");
    fs::write(&tasks, TASKS).unwrap();
    fs::write(&results, RESULTS).unwrap();
    Fixture {
        _dir: dir,
        tasks,
        results,
    }
}

async fn imported_workspace(fixture: &Fixture) -> ReviewWorkspace<SqliteStorage> {
    let storage = SqliteStorage::new_in_memory().await.unwrap();
    let mut workspace = ReviewWorkspace::new(storage);
    let saved = workspace
        .import_files(&fixture.tasks, &fixture.results)
        .await
        .unwrap();
    assert!(saved);
    workspace
}

#[cfg(test)]
mod workspace_tests {
    use super::*;

    #[tokio::test]
    async fn test_import_builds_snapshot() {
        let fixture = write_fixture();
        let workspace = imported_workspace(&fixture).await;

        assert_eq!(workspace.tasks().len(), 5);
        assert_eq!(workspace.expert_opinions().len(), 5);
        assert!(workspace.is_ready());

        let t2 = workspace.get_task_by_id("t-2").unwrap();
        assert_eq!(t2.index, 1);
        assert_eq!(t2.task.duplicates[0].task_id, "t-1");
        assert_eq!(task_state(t2.task), CompletionState::ReadyForReview);
    }

    #[tokio::test]
    async fn test_batch_stats_and_queues() {
        let fixture = write_fixture();
        let workspace = imported_workspace(&fixture).await;

        let stats = workspace.batch_stats();
        assert_eq!(stats.total_batches, 3);
        assert_eq!(stats.completed_batches, 2);
        assert_eq!(stats.completion_percentage, 66.7);

        let ids = |queue| -> Vec<String> {
            workspace
                .queue(queue)
                .iter()
                .map(|t| t.task_id().to_string())
                .collect()
        };
        assert_eq!(ids(Queue::Ready), vec!["t-3", "t-4"]);
        assert_eq!(ids(Queue::Incomplete), vec!["t-1", "t-2", "t-3", "t-4"]);
        assert_eq!(ids(Queue::Completed), vec!["t-1", "t-2", "t-5"]);
    }

    #[tokio::test]
    async fn test_dataset_persists_across_sessions() {
        let fixture = write_fixture();
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("review.db"),
            max_connections: 1,
        };

        {
            let storage = SqliteStorage::new(&config).await.unwrap();
            let mut workspace = ReviewWorkspace::new(storage);
            workspace
                .import_files(&fixture.tasks, &fixture.results)
                .await
                .unwrap();
            workspace.storage().pool().close().await;
        }

        let storage = SqliteStorage::new(&config).await.unwrap();
        let mut workspace = ReviewWorkspace::new(storage);
        assert!(workspace.restore().await);
        assert_eq!(workspace.snapshot().len(), 5);
        assert_eq!(workspace.batch_stats().completed_batches, 2);
    }

    #[tokio::test]
    async fn test_clear_removes_stored_dataset() {
        let fixture = write_fixture();
        let mut workspace = imported_workspace(&fixture).await;

        assert!(workspace.clear().await);

        assert!(!workspace.storage().has_stored_data().await.unwrap());
        assert!(!workspace.restore().await);
    }

    #[tokio::test]
    async fn test_missing_file_leaves_state_untouched() {
        let fixture = write_fixture();
        let mut workspace = imported_workspace(&fixture).await;

        let err = workspace
            .import_files("/no/such/tasks.csv", &fixture.results)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Import(ImportError::Io { .. })));
        assert_eq!(workspace.tasks().len(), 5);
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[tokio::test]
    async fn test_import_then_stats() {
        let fixture = write_fixture();
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let mut workspace = ReviewWorkspace::new(storage);

        let result = execute_command(
            Commands::Import {
                tasks: fixture.tasks.clone(),
                results: fixture.results.clone(),
            },
            &mut workspace,
        )
        .await;
        assert_eq!(result.exit_code, 0, "{}", result.message);
        assert!(result
            .message
            .contains("Imported 5 tasks and 5 expert opinions."));

        let result = execute_command(Commands::Stats { queue: None }, &mut workspace).await;
        assert_eq!(result.exit_code, 0);
        assert!(result.message.contains("Completion:          66.7%"));
    }

    #[tokio::test]
    async fn test_experts_command() {
        let fixture = write_fixture();
        let mut workspace = imported_workspace(&fixture).await;

        let result = execute_command(Commands::Experts, &mut workspace).await;

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.message, "3 experts\n  alice\n  carol\n  dave\n");
    }

    #[tokio::test]
    async fn test_import_rejects_wrong_results_file() {
        let fixture = write_fixture();
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let mut workspace = ReviewWorkspace::new(storage);

        // Tasks file passed twice: it has no "task ID" column.
        let result = execute_command(
            Commands::Import {
                tasks: fixture.tasks.clone(),
                results: fixture.tasks.clone(),
            },
            &mut workspace,
        )
        .await;

        assert_eq!(result.exit_code, 1);
        assert!(result.message.contains("missing required column 'task ID'"));
    }
}
