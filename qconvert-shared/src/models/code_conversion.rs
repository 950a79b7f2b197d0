/// Code conversion history
///
/// One row per conversion request that was persisted. Depending on the route
/// that served the request, failed conversions may or may not be recorded.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE code_conversions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     source_library VARCHAR(32) NOT NULL,
///     target_library VARCHAR(32) NOT NULL,
///     source_code TEXT NOT NULL,
///     converted_code TEXT,
///     status conversion_status NOT NULL,
///     error_message TEXT,
///     complexity VARCHAR(32),
///     execution_time_ms BIGINT NOT NULL DEFAULT 0,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const CONVERSION_COLUMNS: &str = "id, user_id, source_library, target_library, source_code, \
     converted_code, status, error_message, complexity, execution_time_ms, tags, created_at";

/// Outcome of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "conversion_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Failed,
}

impl ConversionStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(ConversionStatus::Success),
            "failed" => Some(ConversionStatus::Failed),
            _ => None,
        }
    }
}

/// Code conversion record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CodeConversion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_library: String,
    pub target_library: String,
    pub source_code: String,
    pub converted_code: Option<String>,
    pub status: ConversionStatus,
    pub error_message: Option<String>,
    pub complexity: Option<String>,
    pub execution_time_ms: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a conversion
#[derive(Debug, Clone)]
pub struct CreateCodeConversion {
    pub user_id: Uuid,
    pub source_library: String,
    pub target_library: String,
    pub source_code: String,
    pub converted_code: Option<String>,
    pub status: ConversionStatus,
    pub error_message: Option<String>,
    pub complexity: Option<String>,
    pub execution_time_ms: i64,
}

/// History listing filters; `None` matches everything
#[derive(Debug, Clone, Default)]
pub struct ConversionFilter {
    pub source_library: Option<String>,
    pub target_library: Option<String>,
    pub status: Option<ConversionStatus>,
}

impl ConversionFilter {
    fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>, user_id: Uuid) {
        builder.push(" WHERE user_id = ").push_bind(user_id);

        if let Some(source) = &self.source_library {
            builder.push(" AND source_library = ").push_bind(source.clone());
        }
        if let Some(target) = &self.target_library {
            builder.push(" AND target_library = ").push_bind(target.clone());
        }
        if let Some(status) = self.status {
            builder.push(" AND status = ").push_bind(status);
        }
    }
}

impl CodeConversion {
    pub async fn create(pool: &PgPool, data: CreateCodeConversion) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO code_conversions (user_id, source_library, target_library, source_code, \
             converted_code, status, error_message, complexity, execution_time_ms) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            CONVERSION_COLUMNS
        );

        sqlx::query_as::<_, CodeConversion>(&query)
            .bind(data.user_id)
            .bind(data.source_library)
            .bind(data.target_library)
            .bind(data.source_code)
            .bind(data.converted_code)
            .bind(data.status)
            .bind(data.error_message)
            .bind(data.complexity)
            .bind(data.execution_time_ms)
            .fetch_one(pool)
            .await
    }

    /// Finds a record by ID regardless of owner
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM code_conversions WHERE id = $1",
            CONVERSION_COLUMNS
        );

        sqlx::query_as::<_, CodeConversion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's conversions matching `filter`, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: &ConversionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM code_conversions",
            CONVERSION_COLUMNS
        ));
        filter.push_where(&mut builder, user_id);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        builder
            .build_query_as::<CodeConversion>()
            .fetch_all(pool)
            .await
    }

    /// Counts a user's conversions matching `filter`
    pub async fn count_by_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: &ConversionFilter,
    ) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM code_conversions");
        filter.push_where(&mut builder, user_id);

        builder.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// Replaces the tag list
    pub async fn update_tags(
        pool: &PgPool,
        id: Uuid,
        tags: Vec<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE code_conversions SET tags = $2 WHERE id = $1 RETURNING {}",
            CONVERSION_COLUMNS
        );

        sqlx::query_as::<_, CodeConversion>(&query)
            .bind(id)
            .bind(tags)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM code_conversions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every record the user owns; returns how many were removed
    pub async fn delete_all_by_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM code_conversions WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
