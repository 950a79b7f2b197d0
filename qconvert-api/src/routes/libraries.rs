/// Quantum library catalog endpoints
///
/// - `GET /api/quantum-libraries` - Stored catalog (public)
/// - `POST /api/quantum-libraries/seed` - Upsert the built-in libraries

use crate::{
    app::AppState,
    error::ApiResult,
    extract::Json,
    response::{ok, ok_with_message, ApiResponse},
};
use axum::{extract::State, Extension};
use qconvert_shared::{auth::identity::Identity, models::quantum_library::QuantumLibrary};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub seeded: usize,
}

pub async fn list_libraries(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<QuantumLibrary>>>> {
    let libraries = QuantumLibrary::list(&state.db).await?;

    Ok(ok(libraries))
}

/// Idempotent; running it twice leaves one row per library
pub async fn seed_libraries(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<SeedResponse>>> {
    let seeded = QuantumLibrary::seed_builtin(&state.db).await?;

    tracing::info!(user_id = %identity.user_id, seeded, "Library catalog seeded");

    Ok(ok_with_message(SeedResponse { seeded }, "Libraries seeded"))
}
