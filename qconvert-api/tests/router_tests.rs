//! Router tests that never reach the database
//!
//! The pool points at a closed port, so any test that accidentally hits
//! PostgreSQL fails fast instead of hanging.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{lazy_app, send};
use tower::ServiceExt;

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = lazy_app(false);

    let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Access denied. No token provided");
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let app = lazy_app(false);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/history",
        Some("not-a-jwt"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_without_password_is_validation_error() {
    let app = lazy_app(false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "ada@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["error"], "Password is required");
}

#[tokio::test]
async fn test_register_missing_field_uses_error_envelope() {
    let app = lazy_app(false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({ "email": "ada@example.com", "password": "secret1" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation_error");
    assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = lazy_app(false);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"email\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_invalid_query_uses_error_envelope() {
    let app = lazy_app(false);

    let (status, body) = send(&app, Method::GET, "/api/workflows?page=abc", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_protected_groups_require_auth() {
    let app = lazy_app(false);

    for (method, uri) in [
        (Method::GET, "/api/billing/overview"),
        (Method::GET, "/api/billing/plans"),
        (Method::POST, "/api/convert"),
        (Method::POST, "/api/qcode-convert/convert"),
        (Method::POST, "/api/workflows"),
        (Method::DELETE, "/api/workflows?id=6f1c0d3e-8a4b-4c5d-9e6f-7a8b9c0d1e2f"),
        (Method::GET, "/api/qdata-clean/files"),
        (Method::GET, "/api/users/stats"),
        (Method::POST, "/api/quantum-libraries/seed"),
    ] {
        let (status, _) = send(&app, method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = lazy_app(false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/qbenchmark-live/providers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert!(headers.contains_key(header::REFERRER_POLICY));
    assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn test_production_adds_hsts() {
    let app = lazy_app(true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/workflows/templates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .contains_key(header::STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn test_supported_libraries_are_public() {
    let app = lazy_app(false);

    let (status, body) = send(&app, Method::GET, "/api/qcode-convert/libraries", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 5);
    assert!(ids.contains(&"qiskit"));
    assert!(ids.contains(&"cirq"));
}

#[tokio::test]
async fn test_workflow_templates_are_public() {
    let app = lazy_app(false);

    let (status, body) = send(&app, Method::GET, "/api/workflows/templates", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let templates = body["data"].as_array().unwrap();
    assert!(!templates.is_empty());
    assert!(templates.iter().all(|t| !t["steps"].as_array().unwrap().is_empty()));
}

#[tokio::test]
async fn test_benchmark_status_adds_up() {
    let app = lazy_app(false);

    let (status, body) = send(&app, Method::GET, "/api/qbenchmark-live/status", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(
        data["providers"].as_u64().unwrap(),
        data["online"].as_u64().unwrap() + data["offline"].as_u64().unwrap()
    );
    assert!(data["checkedAt"].is_string());
}

#[tokio::test]
async fn test_anonymous_workflow_list_outside_production_is_empty() {
    let app = lazy_app(false);

    let (status, body) = send(&app, Method::GET, "/api/workflows?page=2", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], serde_json::json!([]));
    assert_eq!(body["data"]["pagination"]["page"], 2);
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_anonymous_workflow_list_in_production_is_rejected() {
    let app = lazy_app(true);

    let (status, _) = send(&app, Method::GET, "/api/workflows", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn multipart(boundary: &str, parts: &[(&str, Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (name, file_name, content) in parts {
        body.push_str(&format!("--{}\r\n", boundary));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: text/csv\r\n\r\n",
                name, file_name
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    body
}

async fn upload(body: String, boundary: &str) -> (StatusCode, serde_json::Value) {
    let app = lazy_app(false);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/files/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or_default())
}

#[tokio::test]
async fn test_raw_upload_stores_file() {
    let boundary = "qconvert-boundary";
    let body = multipart(
        boundary,
        &[
            ("note", None, "ignored"),
            ("file", Some("runs.csv"), "shots,fidelity\n1024,0.98\n"),
        ],
    );

    let (status, json) = upload(body, boundary).await;

    assert_eq!(status, StatusCode::CREATED);
    let data = &json["data"];
    assert_eq!(data["originalName"], "runs.csv");
    assert_eq!(data["mimeType"], "text/csv");
    assert_eq!(data["fileSize"], 25);
    assert!(data["fileName"].as_str().unwrap().ends_with(".csv"));
    assert_eq!(data["checksum"].as_str().unwrap().len(), 64);

    let path = data["filePath"].as_str().unwrap();
    let stored = tokio::fs::read_to_string(path).await.unwrap();
    assert_eq!(stored, "shots,fidelity\n1024,0.98\n");

    let dir = std::path::Path::new(path).parent().unwrap().to_path_buf();
    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn test_raw_upload_without_file_is_rejected() {
    let boundary = "qconvert-boundary";
    let body = multipart(boundary, &[("note", None, "no file here")]);

    let (status, json) = upload(body, boundary).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = lazy_app(false);

    let (status, _) = send(&app, Method::GET, "/api/does-not-exist", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
