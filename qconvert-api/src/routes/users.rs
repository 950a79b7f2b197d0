/// User statistics endpoint
///
/// `GET /api/users/stats` returns the caller's activity counters next to
/// live record counts. Counters are bumped best-effort and may lag the
/// records they count.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
    response::{ok, ApiResponse},
};
use axum::{extract::State, Extension};
use qconvert_shared::{
    auth::identity::Identity,
    models::user::{User, UserStats},
    usage::UsageReport,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: UserStats,
    pub usage: UsageReport,
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<StatsResponse>>> {
    let user = User::find_by_id(&state.db, identity.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let usage = UsageReport::collect(&state.db, identity.user_id).await?;

    Ok(ok(StatsResponse {
        stats: user.stats,
        usage,
    }))
}
