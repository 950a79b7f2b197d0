/// Code conversion endpoints
///
/// # Endpoints
///
/// - `POST /api/convert` - Convert and record the outcome, success or not
/// - `POST /api/qcode-convert/convert` - Convert and record successes only
/// - `GET /api/qcode-convert/libraries` - Supported libraries
///
/// Both conversion routes run the same handler under a different
/// [`ConversionPolicy`]. A converter that reports failure still yields a
/// 200 response; the outcome's `success` flag carries the result.

use std::time::Instant;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::Json,
    response::{ok, ApiResponse},
};
use axum::{extract::State, Extension};
use qconvert_shared::{
    auth::identity::Identity,
    best_effort::BestEffort,
    convert::{ConversionOutcome, ConversionPolicy, ConversionRequest},
    models::{
        code_conversion::{CodeConversion, ConversionStatus, CreateCodeConversion},
        quantum_library::{builtin_libraries, LibraryInfo},
        user::{StatCounter, User},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conversion request body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertRequest {
    pub source_library: String,
    pub target_library: String,
    pub code: String,
}

/// Conversion result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub success: bool,
    pub source_library: String,
    pub target_library: String,
    pub converted_code: String,
    pub error: Option<String>,
    pub complexity: Option<String>,
    pub execution_time_ms: i64,
    /// History record, when one was written
    pub conversion_id: Option<Uuid>,
}

impl ConvertRequest {
    fn parse(&self) -> ApiResult<ConversionRequest> {
        ConversionRequest::parse(&self.source_library, &self.target_library, &self.code).map_err(
            |messages| {
                ApiError::ValidationError(
                    messages
                        .into_iter()
                        .map(|message| ValidationErrorDetail::new(field_for(&message), message))
                        .collect(),
                )
            },
        )
    }
}

/// Field a conversion validation message refers to
fn field_for(message: &str) -> &'static str {
    if message.starts_with("Code") {
        "code"
    } else {
        "library"
    }
}

/// `POST /api/convert`: every outcome is recorded, write failures fail the request
pub async fn convert(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ConvertRequest>,
) -> ApiResult<Json<ApiResponse<ConvertResponse>>> {
    run_conversion(&state, &identity, &req, ConversionPolicy::RecordAll)
        .await
        .map(ok)
}

/// `POST /api/qcode-convert/convert`: successes are recorded when possible
pub async fn qcode_convert(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ConvertRequest>,
) -> ApiResult<Json<ApiResponse<ConvertResponse>>> {
    run_conversion(&state, &identity, &req, ConversionPolicy::RecordSuccessSoft)
        .await
        .map(ok)
}

/// Supported libraries
pub async fn list_libraries() -> Json<ApiResponse<Vec<LibraryInfo>>> {
    ok(builtin_libraries())
}

async fn run_conversion(
    state: &AppState,
    identity: &Identity,
    req: &ConvertRequest,
    policy: ConversionPolicy,
) -> ApiResult<ConvertResponse> {
    let request = req.parse()?;

    let started = Instant::now();
    let outcome = state.converter.convert(&request).await;
    let execution_time_ms = started.elapsed().as_millis() as i64;

    tracing::info!(
        user_id = %identity.user_id,
        source_library = %request.source_library,
        target_library = %request.target_library,
        success = outcome.success,
        execution_time_ms,
        "Conversion finished"
    );

    bump_stats(state, identity, outcome.success).await;

    let conversion_id = if policy.should_record(outcome.success) {
        record(state, identity, &request, &outcome, execution_time_ms, policy).await?
    } else {
        None
    };

    Ok(ConvertResponse {
        success: outcome.success,
        source_library: request.source_library.to_string(),
        target_library: request.target_library.to_string(),
        converted_code: outcome.code,
        error: outcome.error,
        complexity: outcome.complexity,
        execution_time_ms,
        conversion_id,
    })
}

async fn bump_stats(state: &AppState, identity: &Identity, success: bool) {
    BestEffort::attempt(
        "increment total_conversions",
        User::increment_stat(&state.db, identity.user_id, StatCounter::TotalConversions),
    )
    .await;

    if success {
        BestEffort::attempt(
            "increment successful_conversions",
            User::increment_stat(&state.db, identity.user_id, StatCounter::SuccessfulConversions),
        )
        .await;
    }
}

/// Writes the history record according to the policy
async fn record(
    state: &AppState,
    identity: &Identity,
    request: &ConversionRequest,
    outcome: &ConversionOutcome,
    execution_time_ms: i64,
    policy: ConversionPolicy,
) -> ApiResult<Option<Uuid>> {
    let data = CreateCodeConversion {
        user_id: identity.user_id,
        source_library: request.source_library.to_string(),
        target_library: request.target_library.to_string(),
        source_code: request.code.clone(),
        converted_code: outcome.success.then(|| outcome.code.clone()),
        status: if outcome.success {
            ConversionStatus::Success
        } else {
            ConversionStatus::Failed
        },
        error_message: outcome.error.clone(),
        complexity: outcome.complexity.clone(),
        execution_time_ms,
    };

    let write = CodeConversion::create(&state.db, data);

    if policy.persistence_is_required() {
        return Ok(Some(write.await?.id));
    }

    Ok(BestEffort::attempt("record conversion history", write)
        .await
        .into_applied()
        .map(|conversion| conversion.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_libraries_message() {
        let req = ConvertRequest {
            source_library: "qiskit".to_string(),
            target_library: "qiskit".to_string(),
            code: "qc = QuantumCircuit(2)".to_string(),
        };

        let err = req.parse().unwrap_err();
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(
                    details[0].message,
                    "Source and target libraries must be different"
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: ConvertRequest = serde_json::from_str(r#"{"sourceLibrary": "cirq"}"#).unwrap();
        let err = req.parse().unwrap_err();

        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["library", "code"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_request() {
        let req = ConvertRequest {
            source_library: "cirq".to_string(),
            target_library: "pennylane".to_string(),
            code: "import cirq".to_string(),
        };
        assert!(req.parse().is_ok());
    }
}
