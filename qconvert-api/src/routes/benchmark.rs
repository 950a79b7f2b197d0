/// Benchmark provider catalog
///
/// Both routes are public and read the immutable provider list; no provider
/// is ever contacted.

use crate::{
    app::AppState,
    extract::Json,
    response::{ok, ApiResponse},
};
use axum::extract::State;
use chrono::Utc;
use qconvert_shared::catalog::providers::{BenchmarkProvider, ProviderStatusSummary};

/// `GET /api/qbenchmark-live/providers`
pub async fn list_providers(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<BenchmarkProvider>>> {
    ok(state.catalogs.providers.all().to_vec())
}

/// `GET /api/qbenchmark-live/status`
pub async fn provider_status(State(state): State<AppState>) -> Json<ApiResponse<ProviderStatusSummary>> {
    ok(state.catalogs.providers.summary(Utc::now()))
}
