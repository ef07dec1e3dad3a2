use std::path::PathBuf;

use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },

    /// Persistence failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Source file could not be decoded.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database could not be opened.
    #[error("Database connection failed: {message}")]
    Connection {
        /// Driver message.
        message: String,
    },

    /// Statement failed.
    #[error("Query failed: {message}")]
    Query {
        /// Driver message.
        message: String,
    },

    /// Stored row could not be decoded.
    #[error("Stored dataset is corrupt: {message}")]
    Corrupt {
        /// Offending field and decoder message.
        message: String,
    },

    /// Embedded migrations failed.
    #[error("Migration failed: {message}")]
    Migration {
        /// Migrator message.
        message: String,
    },

    /// Payload (de)serialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unmapped driver error.
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Errors raised while decoding the source datasets
#[derive(Debug, Error)]
pub enum ImportError {
    /// File could not be opened.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Header row lacks the id column.
    #[error("{dataset} file is missing required column '{column}'")]
    MissingColumn {
        /// "Tasks" or "Results".
        dataset: String,
        /// Expected header.
        column: String,
    },

    /// Malformed delimited text.
    #[error("Malformed delimited text: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for dataset imports
pub type ImportResult<T> = Result<T, ImportError>;
