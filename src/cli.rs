//! Operator commands over the persisted review dataset.
//!
//! Each command renders plain text for stdout and an exit code; logging goes
//! to stderr through `tracing`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use tracing::info;

use crate::assignment::{category_counts, expert_stats, list_experts};
use crate::batch::{get_batches_ready_for_review, get_incomplete_batches, Queue};
use crate::completion::{classify, task_state};
use crate::models::TaskWithDuplicates;
use crate::storage::Storage;
use crate::workspace::ReviewWorkspace;

const RULE: &str = "═══════════════════════════════════════════════════════════════════════════════";

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Import a task file and an expert results file, replacing stored data
    Import {
        /// Delimited task file (task_id, prompt, last_human_message, response_A, response_B)
        tasks: PathBuf,
        /// Delimited expert results file (task ID, Task Progress, Review, ...)
        results: PathBuf,
    },

    /// Show batch completion statistics
    Stats {
        /// Count categories over this queue only
        #[arg(long)]
        queue: Option<Queue>,
    },

    /// List the task ids in a review queue: ready, incomplete or completed
    Queue {
        /// Queue name
        queue: Queue,
    },

    /// Show one task with its review state and duplicates
    Show {
        /// Task identifier
        task_id: String,
    },

    /// List evaluators found in the results file
    Experts,

    /// Show completed and available work for an evaluator
    Assign {
        /// Evaluator name as it appears in "Assigned Preference Chooser"
        expert: String,
        /// Offer available work from this queue only
        #[arg(long)]
        queue: Option<Queue>,
    },

    /// Delete the stored dataset
    Clear,
}

impl Commands {
    fn needs_dataset(&self) -> bool {
        !matches!(self, Commands::Import { .. } | Commands::Clear)
    }
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a CLI command against the workspace.
pub async fn execute_command<S: Storage>(
    command: Commands,
    workspace: &mut ReviewWorkspace<S>,
) -> CliResult {
    if command.needs_dataset() {
        if !workspace.restore().await {
            return CliResult::error(
                "No stored dataset. Run `micro-analysis import <TASKS> <RESULTS>` first.",
            );
        }
        if !workspace.is_ready() {
            return CliResult::error(
                "Stored dataset is incomplete: both the task file and the results file need rows.",
            );
        }
    }

    match command {
        Commands::Import { tasks, results } => execute_import(workspace, &tasks, &results).await,
        Commands::Stats { queue } => execute_stats(workspace, queue),
        Commands::Queue { queue } => execute_queue(workspace, queue),
        Commands::Show { task_id } => execute_show(workspace, &task_id),
        Commands::Experts => execute_experts(workspace),
        Commands::Assign { expert, queue } => execute_assign(workspace, &expert, queue),
        Commands::Clear => execute_clear(workspace).await,
    }
}

async fn execute_import<S: Storage>(
    workspace: &mut ReviewWorkspace<S>,
    tasks: &Path,
    results: &Path,
) -> CliResult {
    let saved = match workspace.import_files(tasks, results).await {
        Ok(saved) => saved,
        Err(e) => return CliResult::error(format!("Import failed: {}", e)),
    };

    info!(
        tasks = workspace.tasks().len(),
        expert_opinions = workspace.expert_opinions().len(),
        saved,
        "Import finished"
    );

    let mut output = format!(
        "Imported {} tasks and {} expert opinions.\n",
        workspace.tasks().len(),
        workspace.expert_opinions().len()
    );
    if !workspace.is_ready() {
        output.push_str("Warning: one of the datasets is empty; nothing to analyse yet.\n");
    }
    if !saved {
        output.push_str("Warning: the dataset could not be saved and will not persist.\n");
        return CliResult::error(output);
    }
    CliResult::success(output)
}

/// Tasks in `queue`, or every task when no queue is given.
fn scope<S: Storage>(workspace: &ReviewWorkspace<S>, queue: Option<Queue>) -> Vec<&TaskWithDuplicates> {
    match queue {
        Some(queue) => workspace.queue(queue),
        None => workspace.joined_tasks().iter().collect(),
    }
}

fn scope_label(queue: Option<Queue>) -> String {
    queue.map(|q| format!(" ({} queue)", q)).unwrap_or_default()
}

fn execute_stats<S: Storage>(workspace: &ReviewWorkspace<S>, queue: Option<Queue>) -> CliResult {
    let snapshot = workspace.snapshot();
    let stats = workspace.batch_stats();
    let ready = get_batches_ready_for_review(snapshot.tasks(), &snapshot);
    let incomplete = get_incomplete_batches(snapshot.tasks(), &snapshot);
    let with_duplicates = snapshot.tasks().iter().filter(|t| t.has_duplicates()).count();

    let mut output = String::new();
    output.push_str("\nBatch Completion\n");
    output.push_str(RULE);
    output.push_str("\n\n");
    let _ = writeln!(output, "Tasks:               {}", snapshot.len());
    let _ = writeln!(output, "Tasks with duplicates: {}", with_duplicates);
    let _ = writeln!(output, "Batches:             {}", stats.total_batches);
    let _ = writeln!(output, "Completed batches:   {}", stats.completed_batches);
    let _ = writeln!(output, "Completion:          {:.1}%", stats.completion_percentage);
    let _ = writeln!(output, "Ready for review:    {} tasks", ready.len());
    let _ = writeln!(output, "Incomplete:          {} tasks", incomplete.len());

    let categories = category_counts(scope(workspace, queue));
    if !categories.is_empty() {
        let _ = writeln!(output, "\nCategories{}:", scope_label(queue));
        for entry in categories {
            let _ = writeln!(output, "  {:<20} {}", entry.category, entry.count);
        }
    }

    CliResult::success(output)
}

fn execute_queue<S: Storage>(workspace: &ReviewWorkspace<S>, queue: Queue) -> CliResult {
    let members = workspace.queue(queue);

    let mut output = format!("{} queue: {} tasks\n", queue, members.len());
    for task in members {
        let _ = writeln!(output, "  {}  [{}]", task.task_id(), task_state(task));
    }
    CliResult::success(output)
}

fn execute_show<S: Storage>(workspace: &ReviewWorkspace<S>, task_id: &str) -> CliResult {
    let Some(entry) = workspace.get_task_by_id(task_id) else {
        return CliResult::error(format!("Task not found: {}", task_id));
    };
    let task = entry.task;

    let mut output = String::new();
    let _ = writeln!(
        output,
        "\nTask {} (#{} of {})",
        task.task_id(),
        entry.index + 1,
        workspace.snapshot().len()
    );
    output.push_str(RULE);
    output.push_str("\n\n");
    let _ = writeln!(output, "State:      {}", task_state(task));

    match task.expert_opinion() {
        Some(opinion) => {
            let _ = writeln!(output, "Category:   {}", or_dash(&opinion.category));
            let _ = writeln!(output, "Progress:   {}", or_dash(&opinion.task_progress));
            let _ = writeln!(output, "Evaluator:  {}", or_dash(&opinion.assigned_preference_chooser));
            let _ = writeln!(output, "Choice:     {}", or_dash(&opinion.preference_choice));
            let _ = writeln!(output, "Reviewer:   {}", or_dash(&opinion.assigned_reviewer));
            let _ = writeln!(output, "Review:     {}", or_dash(&opinion.review));
        }
        None => output.push_str("No expert opinion for this task.\n"),
    }

    let _ = writeln!(output, "\nDuplicates ({}):", task.duplicates.len());
    for duplicate in &task.duplicates {
        let _ = writeln!(
            output,
            "  {}  [{}]",
            duplicate.task_id,
            classify(Some(&duplicate.expert_opinion))
        );
    }

    CliResult::success(output)
}

fn execute_experts<S: Storage>(workspace: &ReviewWorkspace<S>) -> CliResult {
    let experts = list_experts(workspace.snapshot().tasks());

    let mut output = format!("{} experts\n", experts.len());
    for expert in experts {
        let _ = writeln!(output, "  {}", expert);
    }
    CliResult::success(output)
}

fn execute_assign<S: Storage>(
    workspace: &ReviewWorkspace<S>,
    expert: &str,
    queue: Option<Queue>,
) -> CliResult {
    let snapshot = workspace.snapshot();
    let stats = expert_stats(expert, snapshot.tasks(), scope(workspace, queue), &snapshot);

    let mut output = String::new();
    let _ = writeln!(output, "\nAssignment for {}", stats.name);
    output.push_str(RULE);
    output.push_str("\n\n");

    let _ = writeln!(output, "Completed work ({} tasks):", stats.completed_count());
    for (category, tasks) in &stats.completed_by_category {
        let _ = writeln!(output, "  {} ({})", category, tasks.len());
    }

    let _ = writeln!(
        output,
        "\nAvailable in those categories{} ({} tasks):",
        scope_label(queue),
        stats.available.len()
    );
    for task in &stats.available {
        let category = task
            .expert_opinion()
            .map(|opinion| opinion.category.as_str())
            .unwrap_or_default();
        let _ = writeln!(output, "  {}  {}", task.task_id(), category);
    }

    CliResult::success(output)
}

async fn execute_clear<S: Storage>(workspace: &mut ReviewWorkspace<S>) -> CliResult {
    if workspace.clear().await {
        CliResult::success("Stored dataset cleared.\n")
    } else {
        CliResult::error("Failed to clear the stored dataset.\n")
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
