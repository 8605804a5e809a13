//! Error types for boox-import

use thiserror::Error;

use crate::epub::EpubError;
use crate::notes::NotesError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("EPUB error: {0}")]
    Epub(#[from] EpubError),

    #[error("Notes error: {0}")]
    Notes(#[from] NotesError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether SQLite refused the operation because another process holds the lock
    pub fn is_database_locked(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(e)) => {
                let message = e.message();
                message.contains("database is locked") || message.contains("database is busy")
            }
            _ => false,
        }
    }
}
