use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{Storage, StoredDataset, CURRENT_DATASET_KEY};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory storage instance, mainly for tests.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_dataset(&self, dataset: &StoredDataset) -> StorageResult<()> {
        let tasks = serde_json::to_string(&dataset.tasks)?;
        let expert_opinions = serde_json::to_string(&dataset.expert_opinions)?;

        sqlx::query(
            r#"
            INSERT INTO datasets (id, tasks, expert_opinions, saved_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                tasks = excluded.tasks,
                expert_opinions = excluded.expert_opinions,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(CURRENT_DATASET_KEY)
        .bind(&tasks)
        .bind(&expert_opinions)
        .bind(dataset.saved_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query {
            message: format!("Failed to save dataset: {}", e),
        })?;

        debug!(
            tasks = dataset.tasks.len(),
            expert_opinions = dataset.expert_opinions.len(),
            "Dataset saved"
        );
        Ok(())
    }

    async fn load_dataset(&self) -> StorageResult<Option<StoredDataset>> {
        let row: Option<DatasetRow> = sqlx::query_as(
            r#"
            SELECT id, tasks, expert_opinions, saved_at
            FROM datasets
            WHERE id = ?
            "#,
        )
        .bind(CURRENT_DATASET_KEY)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredDataset::try_from).transpose()
    }

    async fn clear_dataset(&self) -> StorageResult<()> {
        sqlx::query("DELETE FROM datasets WHERE id = ?")
            .bind(CURRENT_DATASET_KEY)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn has_stored_data(&self) -> StorageResult<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM datasets WHERE id = ?")
            .bind(CURRENT_DATASET_KEY)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct DatasetRow {
    id: String,
    tasks: String,
    expert_opinions: String,
    saved_at: String,
}

impl TryFrom<DatasetRow> for StoredDataset {
    type Error = StorageError;

    fn try_from(row: DatasetRow) -> Result<Self, Self::Error> {
        use chrono::DateTime;

        let corrupt = |field: &str, e: &dyn std::fmt::Display| StorageError::Corrupt {
            message: format!("{} of record '{}': {}", field, row.id, e),
        };

        Ok(Self {
            tasks: serde_json::from_str(&row.tasks).map_err(|e| corrupt("tasks", &e))?,
            expert_opinions: serde_json::from_str(&row.expert_opinions)
                .map_err(|e| corrupt("expert_opinions", &e))?,
            saved_at: DateTime::parse_from_rfc3339(&row.saved_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| corrupt("saved_at", &e))?,
        })
    }
}
