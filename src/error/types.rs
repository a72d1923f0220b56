// src/error/types.rs
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::infrastructure::process::ToolError;

// ============================================================================
// INFRASTRUCTURE ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

// ============================================================================
// EXTRACTION ADAPTER ERRORS
// ============================================================================

/// Failure to turn a URL into a `MetadataDocument`.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The external tool could not be started or exited non-zero.
    #[error("Extraction tool failed: {0}")]
    ToolFailure(String),

    /// The tool succeeded but its output is not a usable metadata document.
    #[error("Malformed extraction output: {0}")]
    MalformedOutput(String),

    #[error("Extraction timed out after {0}s")]
    Timeout(u64),

    #[error("Extraction cancelled")]
    Cancelled,
}

impl From<ToolError> for ExtractionError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::TimedOut { timeout_secs, .. } => ExtractionError::Timeout(timeout_secs),
            ToolError::Cancelled { .. } => ExtractionError::Cancelled,
            other => ExtractionError::ToolFailure(other.to_string()),
        }
    }
}

// ============================================================================
// ASSET MATERIALIZER ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum MaterializationError {
    #[error("Download tool failed: {0}")]
    ToolFailure(String),

    /// The tool reported success but nothing usable was written.
    #[error("No output produced in {}", .0.display())]
    NoOutputProduced(PathBuf),

    #[error("Download timed out after {0}s")]
    Timeout(u64),

    #[error("Download cancelled")]
    Cancelled,

    #[error("Invalid subtitle language tag: {0:?}")]
    InvalidLanguage(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<ToolError> for MaterializationError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::TimedOut { timeout_secs, .. } => MaterializationError::Timeout(timeout_secs),
            ToolError::Cancelled { .. } => MaterializationError::Cancelled,
            other => MaterializationError::ToolFailure(other.to_string()),
        }
    }
}

// ============================================================================
// RECORD STORE ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Primary-key collision on insert.
    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A required column could not be decoded.
    #[error("Corrupt stored record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(err.to_string())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Unavailable(format!("connection pool: {}", err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
