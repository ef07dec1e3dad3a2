//! Dataset lifecycle for a review session.
//!
//! The workspace holds the two source datasets and the derived snapshot (the
//! join index with duplicate groups). Every load replaces both datasets and
//! rebuilds the snapshot from scratch; readers hold an `Arc` to the snapshot
//! they were given and never observe a partial rebuild.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::batch::{calculate_batch_stats, BatchStats, Queue};
use crate::error::AppResult;
use crate::import;
use crate::index::{IndexedTask, JoinIndex};
use crate::models::{ExpertOpinion, Task, TaskWithDuplicates};
use crate::storage::{Storage, StoredDataset};

/// Source datasets plus the snapshot derived from them.
pub struct ReviewWorkspace<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
    expert_opinions: Vec<ExpertOpinion>,
    snapshot: Arc<JoinIndex>,
    loaded: bool,
}

impl<S: Storage> ReviewWorkspace<S> {
    /// Create an empty workspace backed by `storage`.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            tasks: Vec::new(),
            expert_opinions: Vec::new(),
            snapshot: Arc::new(JoinIndex::default()),
            loaded: false,
        }
    }

    /// The persistence backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the persisted dataset pair, if any. Returns whether data was
    /// restored; storage failures are logged and treated as "nothing stored".
    pub async fn restore(&mut self) -> bool {
        match self.storage.load_dataset().await {
            Ok(Some(dataset)) => {
                info!(
                    tasks = dataset.tasks.len(),
                    expert_opinions = dataset.expert_opinions.len(),
                    saved_at = %dataset.saved_at,
                    "Restored stored dataset"
                );
                self.replace(dataset.tasks, dataset.expert_opinions);
                true
            }
            Ok(None) => {
                debug!("No stored dataset");
                false
            }
            Err(e) => {
                error!(error = %e, "Failed to load stored dataset");
                false
            }
        }
    }

    /// Replace both datasets, persist them and rebuild the snapshot.
    ///
    /// The in-memory state is replaced even when persisting fails; the
    /// return value reports whether the save succeeded.
    pub async fn load(&mut self, tasks: Vec<Task>, expert_opinions: Vec<ExpertOpinion>) -> bool {
        let dataset = StoredDataset::new(tasks, expert_opinions);
        let saved = match self.storage.save_dataset(&dataset).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to save dataset");
                false
            }
        };
        self.replace(dataset.tasks, dataset.expert_opinions);
        saved
    }

    /// Decode both source files and [`load`](Self::load) them.
    ///
    /// Decoding errors are returned before any state changes.
    pub async fn import_files(
        &mut self,
        tasks_path: impl AsRef<Path>,
        results_path: impl AsRef<Path>,
    ) -> AppResult<bool> {
        let tasks = import::load_tasks_file(tasks_path)?;
        let expert_opinions = import::load_expert_opinions_file(results_path)?;
        Ok(self.load(tasks, expert_opinions).await)
    }

    /// Delete the stored pair and reset to an empty workspace.
    pub async fn clear(&mut self) -> bool {
        let cleared = match self.storage.clear_dataset().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to clear stored dataset");
                false
            }
        };
        self.tasks.clear();
        self.expert_opinions.clear();
        self.snapshot = Arc::new(JoinIndex::default());
        self.loaded = false;
        info!("Workspace cleared");
        cleared
    }

    fn replace(&mut self, tasks: Vec<Task>, expert_opinions: Vec<ExpertOpinion>) {
        self.tasks = tasks;
        self.expert_opinions = expert_opinions;
        self.loaded = true;

        self.snapshot = if self.tasks.is_empty() || self.expert_opinions.is_empty() {
            warn!(
                tasks = self.tasks.len(),
                expert_opinions = self.expert_opinions.len(),
                "Both datasets are needed before tasks can be analysed"
            );
            Arc::new(JoinIndex::default())
        } else {
            Arc::new(JoinIndex::build(&self.tasks, &self.expert_opinions))
        };
    }

    /// Whether a dataset pair has been loaded or restored.
    pub fn has_data(&self) -> bool {
        self.loaded
    }

    /// Whether the snapshot has been built from two non-empty datasets.
    pub fn is_ready(&self) -> bool {
        !self.snapshot.is_empty()
    }

    /// Raw task rows as loaded.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Expert result rows as loaded.
    pub fn expert_opinions(&self) -> &[ExpertOpinion] {
        &self.expert_opinions
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<JoinIndex> {
        Arc::clone(&self.snapshot)
    }

    /// Look up a joined task and its position by id.
    pub fn get_task_by_id(&self, task_id: &str) -> Option<IndexedTask<'_>> {
        self.snapshot.get(task_id)
    }

    /// Batch statistics of the current snapshot.
    pub fn batch_stats(&self) -> BatchStats {
        calculate_batch_stats(self.snapshot.tasks(), &self.snapshot)
    }

    /// Joined tasks of the current snapshot, in dataset order.
    pub fn joined_tasks(&self) -> &[TaskWithDuplicates] {
        self.snapshot.tasks()
    }

    /// Members of a queue, in dataset order.
    pub fn queue(&self, queue: Queue) -> Vec<&TaskWithDuplicates> {
        let members = queue.members(self.snapshot.tasks(), &self.snapshot);
        self.snapshot
            .tasks()
            .iter()
            .filter(|task| members.contains(task.task_id()))
            .collect()
    }
}
