/// Data file endpoints
///
/// # Endpoints
///
/// - `POST /api/qdata-clean/upload` - Record a stored file (optional auth)
/// - `GET /api/qdata-clean/files` - List (paginated)
/// - `GET|DELETE /api/qdata-clean/files/:id`
/// - `GET /api/qdata-clean/files/:id/raw` - File text
/// - `GET /api/qdata-clean/files/:id/data` - Parsed rows
/// - `GET /api/qdata-clean/files/:id/export?format=json|csv|xlsx` - Download
/// - `GET /api/qdata-clean/files/:id/export-chart?format=png|json` - Chart
/// - `POST /api/qdata-clean/files/:id/process` - Parse and echo options
///
/// Every derived view re-reads the file from disk. Anonymous files are
/// readable by anyone holding the ID.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    middleware::auth::MaybeIdentity,
    response::{created, ok, ok_with_message, ApiResponse, PageQuery, Paginated},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use qconvert_shared::{
    auth::{
        authorization::{ensure_access, ensure_modifiable},
        identity::Identity,
    },
    best_effort::BestEffort,
    files::{
        export::{chart_data, export, ChartData, ChartFormat, ExportFormat, PLACEHOLDER_PNG},
        stem,
        tabular::{infer_metadata, parse, TabularData},
        FileKind, UploadStore,
    },
    models::{
        data_file::{CreateDataFile, DataFile, FileMetadata},
        user::{StatCounter, User},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::io;
use uuid::Uuid;

/// Description of a file already written by `/api/files/upload`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFileRequest {
    pub file_name: String,
    pub original_name: Option<String>,
    /// Ignored beyond logging: the path is always derived from `file_name`
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
}

/// `?format=` for the download routes
#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessRequest {
    pub options: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub file_id: Uuid,
    pub data: TabularData,
    pub options: JsonValue,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DeletedFile {
    pub id: Uuid,
}

/// Loads a file record the caller may read
async fn accessible_file(state: &AppState, identity: &Identity, id: Uuid) -> ApiResult<DataFile> {
    let file = DataFile::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    ensure_access(Some(identity), file.user_id)?;

    Ok(file)
}

async fn read_content(file: &DataFile) -> ApiResult<String> {
    UploadStore::read_text(&file.file_path)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ApiError::NotFound("File content not found".to_string()),
            io::ErrorKind::InvalidData => {
                ApiError::BadRequest("File content is not valid UTF-8 text".to_string())
            }
            _ => e.into(),
        })
}

async fn parsed(file: &DataFile) -> ApiResult<TabularData> {
    let content = read_content(file).await?;
    let kind = FileKind::from_name(&file.file_name);

    parse(&kind, &content).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Metadata for a freshly recorded file; failures leave it empty
async fn derive_metadata(kind: &FileKind, path: &str) -> FileMetadata {
    let content = match UploadStore::read_text(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(error = %e, path = %path, "Could not read file for metadata");
            return FileMetadata::default();
        }
    };

    match infer_metadata(kind, &content) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(error = %e, path = %path, "Could not infer file metadata");
            FileMetadata::default()
        }
    }
}

/// Record a stored file
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(identity): Extension<MaybeIdentity>,
    Json(req): Json<RecordFileRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DataFile>>)> {
    let file_path = state
        .uploads
        .resolve(&req.file_name)
        .ok_or_else(|| ApiError::invalid_field("fileName", "Invalid file name"))?;

    if let Some(claimed) = req.file_path.as_deref().filter(|p| *p != file_path) {
        tracing::debug!(claimed = %claimed, resolved = %file_path, "Ignoring client file path");
    }

    let file_name = req.file_name.trim().to_string();
    let kind = FileKind::from_name(&file_name);

    let file_size = match tokio::fs::metadata(&file_path).await {
        Ok(meta) => meta.len() as i64,
        Err(_) => req.file_size.unwrap_or(0).max(0),
    };

    let metadata = derive_metadata(&kind, &file_path).await;

    let file = DataFile::create(
        &state.db,
        CreateDataFile {
            user_id: identity.user_id(),
            original_name: req
                .original_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| file_name.clone()),
            file_type: req
                .file_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| kind.as_str().to_string()),
            file_name,
            file_path,
            file_size,
            metadata,
        },
    )
    .await?;

    if let Some(user_id) = identity.user_id() {
        BestEffort::attempt(
            "increment files_uploaded",
            User::increment_stat(&state.db, user_id, StatCounter::FilesUploaded),
        )
        .await;
    }

    tracing::info!(file_id = %file.id, user_id = ?file.user_id, "Data file recorded");

    Ok(created(file))
}

/// List the caller's files, newest first
pub async fn list_files(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<DataFile>>>> {
    let page = query.resolve();

    let files = DataFile::list_by_user(&state.db, identity.user_id, page.limit, page.offset()).await?;
    let total = DataFile::count_by_user(&state.db, identity.user_id).await?;

    Ok(ok(Paginated::new(files, page, total)))
}

pub async fn get_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DataFile>>> {
    let file = accessible_file(&state, &identity, id).await?;

    Ok(ok(file))
}

/// Delete the record, then the stored file
///
/// Only the owner may delete; anonymous uploads cannot be deleted through
/// the API. A stored file that cannot be removed is logged and left behind.
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletedFile>>> {
    let file = DataFile::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    ensure_modifiable(&identity, file.user_id)?;

    if !DataFile::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("File not found".to_string()));
    }

    match UploadStore::remove(&file.file_path).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(file_id = %id, path = %file.file_path, "Stored file already missing");
        }
        Err(e) => {
            tracing::warn!(
                file_id = %id,
                path = %file.file_path,
                error = %e,
                "Failed to remove stored file"
            );
        }
    }

    tracing::info!(file_id = %id, user_id = %identity.user_id, "Data file deleted");

    Ok(ok_with_message(DeletedFile { id }, "File deleted"))
}

/// File content as text
pub async fn raw_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let file = accessible_file(&state, &identity, id).await?;
    let content = read_content(&file).await?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], content).into_response())
}

/// Parsed rows
pub async fn file_data(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TabularData>>> {
    let file = accessible_file(&state, &identity, id).await?;

    Ok(ok(parsed(&file).await?))
}

fn export_format(query: &FormatQuery) -> ApiResult<ExportFormat> {
    let format = query.format.as_deref().unwrap_or("json");
    ExportFormat::parse(format)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported export format: {}", format)))
}

fn chart_format(query: &FormatQuery) -> ApiResult<ChartFormat> {
    let format = query.format.as_deref().unwrap_or("png");
    ChartFormat::parse(format)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported chart format: {}", format)))
}

/// `attachment; filename="<stem>.<ext>"` with quotes stripped from the stem
fn content_disposition(original_name: &str, extension: &str) -> String {
    let stem: String = stem(original_name)
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();

    format!("attachment; filename=\"{}.{}\"", stem, extension)
}

/// Download in the requested format
pub async fn export_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Query(query): Query<FormatQuery>,
) -> ApiResult<Response> {
    let format = export_format(&query)?;
    let file = accessible_file(&state, &identity, id).await?;
    let data = parsed(&file).await?;

    let body = export(&data, format).map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&file.original_name, format.extension()),
            ),
        ],
        body,
    )
        .into_response())
}

/// Chart image or chart-ready series
pub async fn export_chart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Query(query): Query<FormatQuery>,
) -> ApiResult<Response> {
    let format = chart_format(&query)?;
    let file = accessible_file(&state, &identity, id).await?;
    let data = parsed(&file).await?;

    Ok(match format {
        ChartFormat::Png => (
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    content_disposition(&file.original_name, "png"),
                ),
            ],
            PLACEHOLDER_PNG,
        )
            .into_response(),
        ChartFormat::Json => {
            let chart: ChartData = chart_data(&data);
            ok(chart).into_response()
        }
    })
}

/// Parse the file and echo the options; no transformation is applied
pub async fn process_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    body: Option<Json<ProcessRequest>>,
) -> ApiResult<Json<ApiResponse<ProcessedFile>>> {
    let options = body
        .and_then(|Json(b)| b.options)
        .unwrap_or_else(|| serde_json::json!({}));

    let file = accessible_file(&state, &identity, id).await?;
    let data = parsed(&file).await?;

    tracing::info!(file_id = %id, rows = data.total_rows, "Data file processed");

    Ok(ok_with_message(
        ProcessedFile {
            file_id: id,
            data,
            options,
            processed_at: Utc::now(),
        },
        "File processed",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(format: Option<&str>) -> FormatQuery {
        FormatQuery {
            format: format.map(str::to_string),
        }
    }

    #[test]
    fn test_export_format_defaults_and_rejects() {
        assert_eq!(export_format(&query(None)).unwrap(), ExportFormat::Json);
        assert_eq!(export_format(&query(Some("XLSX"))).unwrap(), ExportFormat::Xlsx);
        assert!(matches!(
            export_format(&query(Some("pdf"))),
            Err(ApiError::BadRequest(ref m)) if m.contains("pdf")
        ));
    }

    #[test]
    fn test_chart_format() {
        assert_eq!(chart_format(&query(None)).unwrap(), ChartFormat::Png);
        assert_eq!(chart_format(&query(Some("json"))).unwrap(), ChartFormat::Json);
        assert!(chart_format(&query(Some("svg"))).is_err());
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("results.csv", "xlsx"),
            "attachment; filename=\"results.xlsx\""
        );
        assert_eq!(
            content_disposition("we\"ird.json", "csv"),
            "attachment; filename=\"weird.csv\""
        );
    }

    #[test]
    fn test_record_request_accepts_upload_response_shape() {
        let req: RecordFileRequest = serde_json::from_str(
            r#"{"fileName": "a.csv", "originalName": "runs.csv", "filePath": "uploads/a.csv", "fileSize": 12, "fileType": "csv"}"#,
        )
        .unwrap();
        assert_eq!(req.file_name, "a.csv");
        assert_eq!(req.file_size, Some(12));
    }

    #[tokio::test]
    async fn test_derive_metadata_is_best_effort() {
        let missing = derive_metadata(&FileKind::Csv, "/nonexistent/qconvert/file.csv").await;
        assert!(missing.is_empty());

        let path = std::env::temp_dir().join(format!("qconvert-meta-{}.json", Uuid::new_v4()));
        tokio::fs::write(&path, r#"[{"shots": 1024, "backend": "aer"}]"#)
            .await
            .unwrap();

        let path = path.to_string_lossy().into_owned();
        let metadata = derive_metadata(&FileKind::Json, &path).await;
        assert_eq!(metadata.record_count, Some(1));

        let broken = std::env::temp_dir().join(format!("qconvert-meta-{}.json", Uuid::new_v4()));
        tokio::fs::write(&broken, "{not json").await.unwrap();
        assert!(derive_metadata(&FileKind::Json, &broken.to_string_lossy())
            .await
            .is_empty());

        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::remove_file(&broken).await.unwrap();
    }
}
