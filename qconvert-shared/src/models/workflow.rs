/// Workflow model and database operations
///
/// A workflow is a named, ordered list of steps stored inline as JSON. No
/// execution engine exists: running a workflow only records the attempt.
///
/// # Lifecycle
///
/// ```text
/// draft -> running -> completed | failed
/// ```
///
/// Only `run` moves a workflow (to `running`). `completed` and `failed` are
/// valid stored values that nothing in this service writes.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE workflows (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     description VARCHAR(500),
///     status workflow_status NOT NULL DEFAULT 'draft',
///     steps JSONB NOT NULL DEFAULT '[]',
///     template_id VARCHAR(64),
///     last_run_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

const WORKFLOW_COLUMNS: &str =
    "id, user_id, name, description, status, steps, template_id, last_run_at, created_at, updated_at";

/// Workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workflow_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Draft,
    Running,
    Completed,
    Failed,
}

/// Kind of work a step describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Convert,
    Benchmark,
    Clean,
}

/// Step status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

/// One step of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: String,

    #[serde(rename = "type")]
    pub step_type: StepType,

    pub name: String,

    #[serde(default)]
    pub status: StepStatus,

    #[serde(default = "empty_object")]
    pub config: JsonValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

/// Workflow model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: Uuid,

    pub user_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub status: WorkflowStatus,

    pub steps: Json<Vec<WorkflowStep>>,

    /// Template this workflow was created from, if any
    pub template_id: Option<String>,

    pub last_run_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a workflow
#[derive(Debug, Clone)]
pub struct CreateWorkflow {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<WorkflowStep>,
    pub template_id: Option<String>,
}

/// Editable workflow fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkflow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub steps: Option<Vec<WorkflowStep>>,
}

impl Workflow {
    /// Creates a draft workflow
    pub async fn create(pool: &PgPool, data: CreateWorkflow) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO workflows (user_id, name, description, steps, template_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            WORKFLOW_COLUMNS
        );

        sqlx::query_as::<_, Workflow>(&query)
            .bind(data.user_id)
            .bind(data.name.trim().to_string())
            .bind(data.description)
            .bind(Json(data.steps))
            .bind(data.template_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a workflow by ID regardless of owner
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM workflows WHERE id = $1", WORKFLOW_COLUMNS);

        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's workflows, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM workflows WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            WORKFLOW_COLUMNS
        );

        sqlx::query_as::<_, Workflow>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM workflows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Updates editable fields
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateWorkflow,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE workflows SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.steps.is_some() {
            bind_count += 1;
            query.push_str(&format!(", steps = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", WORKFLOW_COLUMNS));

        let mut q = sqlx::query_as::<_, Workflow>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name.trim().to_string());
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(steps) = data.steps {
            q = q.bind(Json(steps));
        }

        q.fetch_optional(pool).await
    }

    /// Records a run: status `running`, `last_run_at` stamped, steps untouched
    pub async fn mark_running(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE workflows SET status = $2, last_run_at = NOW(), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            WORKFLOW_COLUMNS
        );

        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .bind(WorkflowStatus::Running)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_defaults() {
        let step: WorkflowStep = serde_json::from_value(json!({
            "id": "step-1",
            "type": "convert",
            "name": "Convert circuit"
        }))
        .unwrap();

        assert_eq!(step.step_type, StepType::Convert);
        assert_eq!(step.status, StepStatus::Pending);
        assert_eq!(step.config, json!({}));
        assert!(step.result.is_none());
    }

    #[test]
    fn test_step_rejects_unknown_type() {
        let result: Result<WorkflowStep, _> = serde_json::from_value(json!({
            "id": "step-1",
            "type": "deploy",
            "name": "Deploy"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_step_serializes_type_field() {
        let step = WorkflowStep {
            id: "s1".to_string(),
            step_type: StepType::Benchmark,
            name: "Run benchmark".to_string(),
            status: StepStatus::Pending,
            config: json!({"shots": 1024}),
            result: None,
        };

        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["type"], "benchmark");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["config"]["shots"], 1024);
        assert!(value.get("result").is_none());
    }
}
