/// Raw file upload
///
/// `POST /api/files/upload` takes a multipart body and stores the first
/// part that carries a file name. No authentication and no database record:
/// the returned description is what `/api/qdata-clean/upload` records.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
    response::{created, ApiResponse},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};
use qconvert_shared::files::mime_type;
use serde::Serialize;

/// Stored file description
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    /// Hex SHA-256 of the stored bytes
    pub checksum: String,
}

/// Client file name with any directory part removed
fn client_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();

    (!name.is_empty()).then(|| name.to_string())
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<UploadResponse>>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let Some(original_name) = field.file_name().and_then(client_file_name) else {
            continue;
        };

        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let stored = state.uploads.save(&original_name, &bytes).await?;

        let mime = match mime_type(&original_name) {
            "application/octet-stream" => {
                content_type.unwrap_or_else(|| "application/octet-stream".to_string())
            }
            known => known.to_string(),
        };

        tracing::info!(
            file_name = %stored.file_name,
            original_name = %original_name,
            size = stored.file_size,
            "File uploaded"
        );

        return Ok(created(UploadResponse {
            file_name: stored.file_name,
            original_name,
            file_path: stored.file_path,
            file_size: stored.file_size,
            mime_type: mime,
            checksum: stored.checksum,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}
