//! # Micro Analysis
//!
//! Duplicate detection and batch-completion tracking for pairwise AI response
//! review. Tasks (a prompt plus two candidate responses) are joined with the
//! expert opinions recorded for them, grouped by normalized content, and
//! rolled up into batches whose completion drives the review queues.
//!
//! ## Pipeline
//!
//! ```text
//! tasks file ──┐
//!              ├─→ JoinIndex (content keys → duplicate groups)
//! results file ┘          ↓
//!                  completion states → batch stats / review queues
//!                         ↓
//!                  SQLite (persisted dataset pair)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use micro_analysis::{Config, ReviewWorkspace};
//! use micro_analysis::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let mut workspace = ReviewWorkspace::new(storage);
//!     workspace.import_files("tasks.csv", "results.csv").await?;
//!     println!("{:?}", workspace.batch_stats());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Evaluator routing: completed work and available tasks per expert.
pub mod assignment;
/// Batch statistics and review queues.
pub mod batch;
/// Operator command line.
pub mod cli;
/// Task completion classification.
pub mod completion;
/// Configuration management.
pub mod config;
/// Content keys and duplicate grouping.
pub mod dedup;
/// Error types and result aliases for the application.
pub mod error;
/// Delimited-text decoding of the source datasets.
pub mod import;
/// Task/expert join index.
pub mod index;
/// Core domain records.
pub mod models;
/// SQLite storage layer for persistence.
pub mod storage;
/// Dataset lifecycle and snapshot management.
pub mod workspace;

pub use config::Config;
pub use dedup::{content_key, identify_duplicate_tasks};
pub use error::{AppError, AppResult};
pub use index::JoinIndex;
pub use models::{DuplicateTask, ExpertOpinion, Task, TaskWithDuplicates};
pub use workspace::ReviewWorkspace;
