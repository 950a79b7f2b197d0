/// Data file model and database operations
///
/// A data file row records where an uploaded file lives on disk and what was
/// learned about its shape at upload time. Anonymous uploads are allowed and
/// store a NULL owner.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE data_files (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID REFERENCES users(id) ON DELETE CASCADE,
///     file_name VARCHAR(255) NOT NULL,
///     original_name VARCHAR(255) NOT NULL,
///     file_path VARCHAR(1024) NOT NULL,
///     file_size BIGINT NOT NULL CHECK (file_size >= 0),
///     file_type VARCHAR(32) NOT NULL,
///     status data_file_status NOT NULL DEFAULT 'uploaded',
///     metadata JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

const DATA_FILE_COLUMNS: &str = "id, user_id, file_name, original_name, file_path, file_size, \
     file_type, status, metadata, created_at, updated_at";

/// Data file status
///
/// Only `uploaded` is ever written; the remaining states exist for clients
/// that already understand them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "data_file_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DataFileStatus {
    Uploaded,
    Processing,
    Processed,
    Error,
}

/// Shape information inferred from file contents
///
/// Every field is optional; a file that could not be parsed carries empty
/// metadata (`{}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,

    /// Column name to JSON type name (`string`, `number`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_types: Option<BTreeMap<String, String>>,
}

impl FileMetadata {
    pub fn is_empty(&self) -> bool {
        self.record_count.is_none() && self.columns.is_none() && self.column_types.is_none()
    }
}

/// Data file model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DataFile {
    pub id: Uuid,

    /// Owner; None for anonymous uploads
    pub user_id: Option<Uuid>,

    /// Generated unique name on disk
    pub file_name: String,

    /// Name the client uploaded the file under
    pub original_name: String,

    pub file_path: String,

    /// Size in bytes
    pub file_size: i64,

    /// Lowercased extension (`json`, `csv`, ...)
    pub file_type: String,

    pub status: DataFileStatus,

    pub metadata: Json<FileMetadata>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for recording an uploaded file
#[derive(Debug, Clone)]
pub struct CreateDataFile {
    pub user_id: Option<Uuid>,
    pub file_name: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub metadata: FileMetadata,
}

impl DataFile {
    pub async fn create(pool: &PgPool, data: CreateDataFile) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO data_files (user_id, file_name, original_name, file_path, file_size, \
             file_type, metadata) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            DATA_FILE_COLUMNS
        );

        sqlx::query_as::<_, DataFile>(&query)
            .bind(data.user_id)
            .bind(data.file_name)
            .bind(data.original_name)
            .bind(data.file_path)
            .bind(data.file_size)
            .bind(data.file_type)
            .bind(Json(data.metadata))
            .fetch_one(pool)
            .await
    }

    /// Finds a file by ID regardless of owner
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM data_files WHERE id = $1", DATA_FILE_COLUMNS);

        sqlx::query_as::<_, DataFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's files, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM data_files WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            DATA_FILE_COLUMNS
        );

        sqlx::query_as::<_, DataFile>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM data_files WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Sum of `file_size` over the user's files, in bytes
    pub async fn total_size_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(file_size), 0)::BIGINT FROM data_files WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Deletes the record; returns whether a row was removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM data_files WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
