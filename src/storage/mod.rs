//! Storage layer for dataset persistence.
//!
//! The loaded dataset pair (raw tasks and expert opinions) is persisted as a
//! single record under a fixed key, so a later session can pick up where the
//! previous one stopped. Saving replaces the previous pair.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::models::{ExpertOpinion, Task};

/// Key under which the current dataset pair is stored.
pub const CURRENT_DATASET_KEY: &str = "current_data";

/// The persisted dataset pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDataset {
    /// Raw task rows.
    pub tasks: Vec<Task>,
    /// Expert result rows.
    pub expert_opinions: Vec<ExpertOpinion>,
    /// When the pair was saved.
    pub saved_at: DateTime<Utc>,
}

impl StoredDataset {
    /// Wrap a dataset pair, stamped with the current time.
    pub fn new(tasks: Vec<Task>, expert_opinions: Vec<ExpertOpinion>) -> Self {
        Self {
            tasks,
            expert_opinions,
            saved_at: Utc::now(),
        }
    }
}

/// Storage trait for dataset persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Save the dataset pair, replacing any previously stored one.
    async fn save_dataset(&self, dataset: &StoredDataset) -> StorageResult<()>;
    /// Load the stored dataset pair, if any.
    async fn load_dataset(&self) -> StorageResult<Option<StoredDataset>>;
    /// Delete the stored dataset pair. Clearing an empty store succeeds.
    async fn clear_dataset(&self) -> StorageResult<()>;
    /// Whether a dataset pair is stored.
    async fn has_stored_data(&self) -> StorageResult<bool>;
}
