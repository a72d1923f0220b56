// src/repositories/resource_repository.rs
//
// Record Store
//
// RULES:
// - save is a single INSERT, never an upsert
// - A primary-key collision is a Conflict, not an overwrite
// - Collections are JSON text; unreadable collections read back as empty
// - Unreadable identity or timestamp is Corrupt (the row is unusable)
// - created_at is fixed-width RFC 3339 (nanoseconds, Z) so it sorts as text

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::ResourceRecord;
use crate::error::{StoreError, StoreResult};

const SELECT_COLUMNS: &str = "SELECT id, native_id, title, description, thumbnail_url,
            duration_seconds, owner_name, subtitle_languages,
            local_media_path, local_subtitle_paths, created_at
     FROM resources";

#[cfg_attr(test, mockall::automock)]
pub trait ResourceRepository: Send + Sync {
    fn save(&self, record: &ResourceRecord) -> StoreResult<()>;

    fn find_by_id(&self, id: Uuid) -> StoreResult<ResourceRecord>;

    /// Most recently created record carrying `native_id`.
    fn find_by_native_id(&self, native_id: &str) -> StoreResult<ResourceRecord>;
}

pub struct SqliteResourceRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteResourceRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<ResourceRecord> {
        let id_str: String = row.get("id")?;
        let created_at_str: String = row.get("created_at")?;

        let id = Uuid::parse_str(&id_str)
            .map_err(|e| conversion_failure(0, format!("Invalid UUID '{}': {}", id_str, e)))?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                conversion_failure(
                    10,
                    format!("Invalid created_at timestamp '{}': {}", created_at_str, e),
                )
            })?;

        let duration: i64 = row.get("duration_seconds")?;

        Ok(ResourceRecord {
            id,
            native_id: row.get("native_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            thumbnail_url: row.get("thumbnail_url")?,
            duration_seconds: u64::try_from(duration).unwrap_or(0),
            owner_name: row.get("owner_name")?,
            subtitle_languages: read_collection(&id_str, "subtitle_languages", row)?,
            local_media_path: row.get("local_media_path")?,
            local_subtitle_paths: read_collection(&id_str, "local_subtitle_paths", row)?,
            created_at,
        })
    }

    fn find_one(&self, filter: &str, key: &str) -> StoreResult<ResourceRecord> {
        let conn = self.pool.get()?;
        let sql = format!("{} {}", SELECT_COLUMNS, filter);

        conn.query_row(&sql, params![key], Self::row_to_record)
            .optional()
            .map_err(|e| read_error(key, e))?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

impl ResourceRepository for SqliteResourceRepository {
    fn save(&self, record: &ResourceRecord) -> StoreResult<()> {
        let conn = self.pool.get()?;

        let duration = i64::try_from(record.duration_seconds).map_err(|_| {
            StoreError::Corrupt(format!(
                "duration {} out of range for {}",
                record.duration_seconds, record.id
            ))
        })?;

        conn.execute(
            "INSERT INTO resources (
                id, native_id, title, description, thumbnail_url,
                duration_seconds, owner_name, subtitle_languages,
                local_media_path, local_subtitle_paths, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.id.to_string(),
                record.native_id,
                record.title,
                record.description,
                record.thumbnail_url,
                duration,
                record.owner_name,
                write_collection(&record.subtitle_languages)?,
                record.local_media_path,
                write_collection(&record.local_subtitle_paths)?,
                record.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;

        log::debug!("[store] saved {} ({})", record.id, record.native_id);
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> StoreResult<ResourceRecord> {
        self.find_one("WHERE id = ?1", &id.to_string())
    }

    fn find_by_native_id(&self, native_id: &str) -> StoreResult<ResourceRecord> {
        self.find_one(
            "WHERE native_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
            native_id,
        )
    }
}

// ============================================================================
// COLUMN HELPERS
// ============================================================================

fn write_collection(values: &[String]) -> StoreResult<String> {
    serde_json::to_string(values).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Lenient read: NULL, unparsable or wrongly shaped JSON becomes empty.
fn read_collection(id: &str, column: &str, row: &Row) -> rusqlite::Result<Vec<String>> {
    let raw: Option<String> = row.get(column)?;
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(values) => Ok(values),
        Err(e) => {
            log::warn!(
                "[store] unreadable {} on {}, using empty list: {}",
                column,
                id,
                e
            );
            Ok(Vec::new())
        }
    }
}

fn conversion_failure(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn read_error(key: &str, err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            StoreError::Corrupt(format!("{}: {}", key, err))
        }
        other => StoreError::from(other),
    }
}
