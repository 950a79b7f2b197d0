/// Workflow endpoints
///
/// # Endpoints
///
/// - `GET /api/workflows` - List (paginated)
/// - `POST /api/workflows` - Create a draft
/// - `GET|PUT|DELETE /api/workflows/:id`
/// - `DELETE /api/workflows?id=<id>` - Delete by query parameter
/// - `POST /api/workflows/:id/run` - Mark running
/// - `GET /api/workflows/templates` - Template catalog
/// - `POST /api/workflows/templates/:template_id/use` - Create from a template
///
/// Workflows are records only: `run` flips the status to `running` and
/// stamps `last_run_at`; no step is ever executed.
///
/// Outside production the list route sits behind the optional gate and an
/// anonymous caller gets an empty page.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    middleware::auth::MaybeIdentity,
    response::{created, ok, ok_with_message, ApiResponse, PageQuery, Paginated},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension,
};
use qconvert_shared::{
    auth::{authorization::ensure_owner, identity::Identity},
    best_effort::BestEffort,
    catalog::templates::WorkflowTemplate,
    models::{
        user::{StatCounter, User},
        workflow::{CreateWorkflow, StepStatus, StepType, UpdateWorkflow, Workflow, WorkflowStep},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

/// A step as submitted by a client; `id` and `status` are optional
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub step_type: StepType,

    pub name: String,

    pub status: Option<StepStatus>,

    pub config: Option<JsonValue>,
}

/// Turns submitted steps into stored steps
///
/// Missing IDs become `step-<position>`; `keep_status` false resets every
/// step to `pending`.
fn build_steps(inputs: Vec<StepInput>, keep_status: bool) -> ApiResult<Vec<WorkflowStep>> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let name = input.name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::invalid_field("steps", "Step name is required"));
            }

            let config = input.config.unwrap_or_else(|| serde_json::json!({}));
            if !config.is_object() {
                return Err(ApiError::invalid_field(
                    "steps",
                    "Step config must be an object",
                ));
            }

            Ok(WorkflowStep {
                id: input
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| format!("step-{}", i + 1)),
                step_type: input.step_type,
                name,
                status: if keep_status {
                    input.status.unwrap_or_default()
                } else {
                    StepStatus::Pending
                },
                config,
                result: None,
            })
        })
        .collect()
}

/// Create workflow request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub steps: Vec<StepInput>,
}

/// Update workflow request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflowRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub steps: Option<Vec<StepInput>>,
}

/// Optional overrides when creating from a template
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UseTemplateRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// `?id=` for the query-parameter delete
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DeletedWorkflow {
    pub id: Uuid,
}

async fn owned_workflow(state: &AppState, identity: &Identity, id: Uuid) -> ApiResult<Workflow> {
    let workflow = Workflow::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Workflow not found".to_string()))?;

    ensure_owner(identity, workflow.user_id)?;

    Ok(workflow)
}

async fn bump_workflows_created(state: &AppState, user_id: Uuid) {
    BestEffort::attempt(
        "increment workflows_created",
        User::increment_stat(&state.db, user_id, StatCounter::WorkflowsCreated),
    )
    .await;
}

/// List the caller's workflows, newest first
pub async fn list_workflows(
    State(state): State<AppState>,
    Extension(identity): Extension<MaybeIdentity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<Workflow>>>> {
    let page = query.resolve();

    let Some(user_id) = identity.user_id() else {
        return Ok(ok(Paginated::empty(page)));
    };

    let workflows = Workflow::list_by_user(&state.db, user_id, page.limit, page.offset()).await?;
    let total = Workflow::count_by_user(&state.db, user_id).await?;

    Ok(ok(Paginated::new(workflows, page, total)))
}

/// Create a draft workflow
pub async fn create_workflow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(mut req): Json<CreateWorkflowRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Workflow>>)> {
    req.name = req.name.trim().to_string();
    req.validate()?;

    let steps = build_steps(req.steps, false)?;

    let workflow = Workflow::create(
        &state.db,
        CreateWorkflow {
            user_id: identity.user_id,
            name: req.name,
            description: req.description,
            steps,
            template_id: None,
        },
    )
    .await?;

    bump_workflows_created(&state, identity.user_id).await;

    tracing::info!(user_id = %identity.user_id, workflow_id = %workflow.id, "Workflow created");

    Ok(created(workflow))
}

pub async fn get_workflow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Workflow>>> {
    let workflow = owned_workflow(&state, &identity, id).await?;

    Ok(ok(workflow))
}

/// Update name, description or steps
pub async fn update_workflow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(mut req): Json<UpdateWorkflowRequest>,
) -> ApiResult<Json<ApiResponse<Workflow>>> {
    req.name = req.name.map(|n| n.trim().to_string());
    req.validate()?;

    let steps = req.steps.map(|s| build_steps(s, true)).transpose()?;

    owned_workflow(&state, &identity, id).await?;

    let workflow = Workflow::update(
        &state.db,
        id,
        UpdateWorkflow {
            name: req.name,
            description: req.description,
            steps,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Workflow not found".to_string()))?;

    Ok(ok(workflow))
}

async fn remove_workflow(state: &AppState, identity: &Identity, id: Uuid) -> ApiResult<()> {
    owned_workflow(state, identity, id).await?;

    if !Workflow::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Workflow not found".to_string()));
    }

    tracing::info!(user_id = %identity.user_id, workflow_id = %id, "Workflow deleted");
    Ok(())
}

pub async fn delete_workflow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletedWorkflow>>> {
    remove_workflow(&state, &identity, id).await?;

    Ok(ok_with_message(DeletedWorkflow { id }, "Workflow deleted"))
}

/// `DELETE /api/workflows?id=<id>`
///
/// Sits behind the strict gate, so the caller's identity is always known.
pub async fn delete_workflow_by_query(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<ApiResponse<DeletedWorkflow>>> {
    let id = query
        .id
        .ok_or_else(|| ApiError::BadRequest("Workflow ID is required".to_string()))?;

    remove_workflow(&state, &identity, id).await?;

    Ok(ok_with_message(DeletedWorkflow { id }, "Workflow deleted"))
}

/// Mark a workflow running
pub async fn run_workflow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Workflow>>> {
    owned_workflow(&state, &identity, id).await?;

    let workflow = Workflow::mark_running(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Workflow not found".to_string()))?;

    tracing::info!(user_id = %identity.user_id, workflow_id = %id, "Workflow run requested");

    Ok(ok_with_message(workflow, "Workflow started"))
}

/// Template catalog
pub async fn list_templates(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<WorkflowTemplate>>> {
    ok(state.catalogs.templates.all().to_vec())
}

/// Create a draft workflow from a template
pub async fn use_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(template_id): Path<String>,
    body: Option<Json<UseTemplateRequest>>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Workflow>>)> {
    let mut req = body.map(|Json(b)| b).unwrap_or_default();
    req.name = req.name.map(|n| n.trim().to_string());
    req.validate()?;

    let template = state
        .catalogs
        .templates
        .get(&template_id)
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    let workflow = Workflow::create(
        &state.db,
        CreateWorkflow {
            user_id: identity.user_id,
            name: req.name.unwrap_or_else(|| template.name.to_string()),
            description: req
                .description
                .or_else(|| Some(template.description.to_string())),
            steps: template.materialize_steps(),
            template_id: Some(template.id.to_string()),
        },
    )
    .await?;

    bump_workflows_created(&state, identity.user_id).await;

    tracing::info!(
        user_id = %identity.user_id,
        workflow_id = %workflow.id,
        template_id = template.id,
        "Workflow created from template"
    );

    Ok(created(workflow))
}
