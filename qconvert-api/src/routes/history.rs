/// Conversion history endpoints
///
/// - `GET /api/history` - Paginated, filterable by `sourceLibrary`, `targetLibrary`, `status`
/// - `GET /api/history/:id`
/// - `PATCH /api/history/:id` - Replace tags
/// - `DELETE /api/history/:id`
/// - `DELETE /api/history` - Clear every record the caller owns

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    response::{ok, ok_with_message, ApiResponse, PageQuery, Paginated},
};
use axum::{extract::State, Extension};
use qconvert_shared::{
    auth::{authorization::ensure_owner, identity::Identity},
    models::{
        code_conversion::{CodeConversion, ConversionFilter, ConversionStatus},
        quantum_library::LibraryId,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Most tags one record may carry
pub const MAX_TAGS: usize = 10;

/// Longest accepted tag, in characters
pub const MAX_TAG_LENGTH: usize = 30;

/// Listing query: pagination plus filters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub source_library: Option<String>,
    pub target_library: Option<String>,
    pub status: Option<String>,
}

impl HistoryQuery {
    fn filter(&self) -> ApiResult<ConversionFilter> {
        let library = |value: &Option<String>| -> ApiResult<Option<String>> {
            match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                None => Ok(None),
                Some(v) => v
                    .parse::<LibraryId>()
                    .map(|id| Some(id.as_str().to_string()))
                    .map_err(|e| ApiError::BadRequest(e.to_string())),
            }
        };

        let status = match self.status.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            None => None,
            Some(v) => Some(
                ConversionStatus::parse(v)
                    .ok_or_else(|| ApiError::BadRequest(format!("Invalid status: {}", v)))?,
            ),
        };

        Ok(ConversionFilter {
            source_library: library(&self.source_library)?,
            target_library: library(&self.target_library)?,
            status,
        })
    }
}

/// Tag replacement body
#[derive(Debug, Deserialize)]
pub struct UpdateTagsRequest {
    pub tags: Vec<String>,
}

/// Trims tags, drops duplicates and checks the limits
fn normalize_tags(tags: Vec<String>) -> ApiResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());

    for tag in tags {
        let tag = tag.trim().to_string();
        let length = tag.chars().count();
        if length == 0 || length > MAX_TAG_LENGTH {
            return Err(ApiError::invalid_field(
                "tags",
                format!("Each tag must be 1-{} characters", MAX_TAG_LENGTH),
            ));
        }
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }

    if normalized.len() > MAX_TAGS {
        return Err(ApiError::invalid_field(
            "tags",
            format!("At most {} tags are allowed", MAX_TAGS),
        ));
    }

    Ok(normalized)
}

#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub deleted: u64,
}

async fn owned_conversion(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> ApiResult<CodeConversion> {
    let conversion = CodeConversion::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Conversion not found".to_string()))?;

    ensure_owner(identity, conversion.user_id)?;

    Ok(conversion)
}

/// List the caller's conversions, newest first
pub async fn list_history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<CodeConversion>>>> {
    let filter = query.filter()?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve();

    let items = CodeConversion::list_by_user(
        &state.db,
        identity.user_id,
        &filter,
        page.limit,
        page.offset(),
    )
    .await?;
    let total = CodeConversion::count_by_user(&state.db, identity.user_id, &filter).await?;

    Ok(ok(Paginated::new(items, page, total)))
}

pub async fn get_history_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CodeConversion>>> {
    let conversion = owned_conversion(&state, &identity, id).await?;

    Ok(ok(conversion))
}

/// Replace a record's tags
pub async fn update_history_tags(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTagsRequest>,
) -> ApiResult<Json<ApiResponse<CodeConversion>>> {
    let tags = normalize_tags(req.tags)?;
    owned_conversion(&state, &identity, id).await?;

    let conversion = CodeConversion::update_tags(&state.db, id, tags)
        .await?
        .ok_or_else(|| ApiError::NotFound("Conversion not found".to_string()))?;

    Ok(ok(conversion))
}

pub async fn delete_history_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    owned_conversion(&state, &identity, id).await?;

    if !CodeConversion::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Conversion not found".to_string()));
    }

    Ok(ok_with_message(id, "Conversion deleted"))
}

/// Delete every record the caller owns
pub async fn clear_history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<ClearHistoryResponse>>> {
    let deleted = CodeConversion::delete_all_by_user(&state.db, identity.user_id).await?;

    tracing::info!(user_id = %identity.user_id, deleted, "Conversion history cleared");

    Ok(ok_with_message(
        ClearHistoryResponse { deleted },
        "Conversion history cleared",
    ))
}
