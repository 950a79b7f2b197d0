/// Integration tests for the QConvert API
///
/// These run against a real PostgreSQL database:
///
/// ```bash
/// TEST_DATABASE_URL=postgresql://localhost/qconvert_test cargo test -- --ignored
/// ```
///
/// Each test creates its own user and removes it (and everything it owns)
/// on the way out.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{send, TestContext, TEST_PASSWORD};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_register_and_login() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("reg-{}@example.com", uuid::Uuid::new_v4());

    let register = json!({"name": "Ada Lovelace", "email": email, "password": "engine42"});

    let (status, body) = send(&ctx.app, Method::POST, "/api/auth/register", None, Some(register.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["user"]["passwordHash"].is_null());

    let (status, body) = send(&ctx.app, Method::POST, "/api/auth/register", None, Some(register)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, _) = send(
        &ctx.app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": email.to_uppercase(), "password": "engine42"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &ctx.app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = send(
        &ctx.app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "nobody-here@example.com", "password": TEST_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_me_and_password_change() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send(Method::GET, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], ctx.user.email);

    let (status, _) = ctx
        .send(
            Method::PUT,
            "/api/auth/password",
            Some(json!({"currentPassword": "not-it", "newPassword": "brand-new"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(
            Method::PUT,
            "/api/auth/password",
            Some(json!({"currentPassword": TEST_PASSWORD, "newPassword": "brand-new"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_upgrade_creates_single_invoice() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send(Method::GET, "/api/billing/overview", None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["subscription"]["tier"], "free");
    assert!(body["data"]["subscription"]["currentPeriodEnd"].is_string());

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/billing/subscription/upgrade",
            Some(json!({"planId": "pro"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["subscription"]["tier"], "pro");
    assert_eq!(body["data"]["invoice"]["amount"], 29);
    assert_eq!(body["data"]["invoice"]["status"], "paid");

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/billing/subscription/upgrade",
            Some(json!({"planId": "free"})),
        )
        .await;
    assert!(body["data"]["invoice"].is_null());

    let (_, body) = ctx.send(Method::GET, "/api/billing/history", None).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (status, body) = ctx
        .send(Method::POST, "/api/billing/subscription/upgrade", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Plan ID is required");

    let (_, body) = ctx
        .send(Method::POST, "/api/billing/subscription/cancel", None)
        .await;
    assert_eq!(body["data"]["tier"], "free");
    assert_eq!(body["data"]["status"], "canceled");
    assert!(body["data"]["currentPeriodEnd"].is_null());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_payment_method_default_invariant() {
    let ctx = TestContext::new().await.unwrap();

    let (status, card) = ctx
        .send(
            Method::POST,
            "/api/billing/payment-methods",
            Some(json!({"type": "card", "last4": "4242", "brand": "Visa", "expiryMonth": 12, "expiryYear": 2030})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", card);
    assert_eq!(card["data"]["isDefault"], true);

    let (_, paypal) = ctx
        .send(
            Method::POST,
            "/api/billing/payment-methods",
            Some(json!({"type": "paypal", "email": "ada@example.com"})),
        )
        .await;
    assert_eq!(paypal["data"]["isDefault"], false);

    let card_id = card["data"]["id"].as_str().unwrap().to_string();
    let paypal_id = paypal["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/api/billing/payment-methods/{}/default", paypal_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = ctx.send(Method::GET, "/api/billing/payment-methods", None).await;
    let defaults: Vec<_> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["isDefault"] == true)
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(defaults, vec![paypal_id.clone()]);

    let (_, deleted) = ctx
        .send(
            Method::DELETE,
            &format!("/api/billing/payment-methods/{}", paypal_id),
            None,
        )
        .await;
    assert_eq!(deleted["data"]["promotedDefault"], card_id.as_str());

    let (other, other_token) = ctx.other_user().await.unwrap();
    let (status, _) = send(
        &ctx.app,
        Method::DELETE,
        &format!("/api/billing/payment-methods/{}", card_id),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(other.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_conversion_recording_policies() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/convert",
            Some(json!({"sourceLibrary": "qiskit", "targetLibrary": "qiskit", "code": "qc = 1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Source and target libraries must be different");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/convert",
            Some(json!({"sourceLibrary": "qiskit", "targetLibrary": "cirq", "code": "please fail"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], false);
    assert!(body["data"]["conversionId"].is_string());

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/qcode-convert/convert",
            Some(json!({"sourceLibrary": "cirq", "targetLibrary": "pennylane", "code": "please fail"})),
        )
        .await;
    assert_eq!(body["data"]["success"], false);
    assert!(body["data"]["conversionId"].is_null());

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/qcode-convert/convert",
            Some(json!({"sourceLibrary": "cirq", "targetLibrary": "pennylane", "code": "import cirq"})),
        )
        .await;
    assert_eq!(body["data"]["success"], true);
    let success_id = body["data"]["conversionId"].as_str().unwrap().to_string();

    let (_, body) = ctx.send(Method::GET, "/api/history", None).await;
    assert_eq!(body["data"]["pagination"]["total"], 2);

    let (_, body) = ctx.send(Method::GET, "/api/history?status=failed", None).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (status, body) = ctx
        .send(
            Method::PATCH,
            &format!("/api/history/{}", success_id),
            Some(json!({"tags": ["bell", " bell ", "ghz"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tags"], json!(["bell", "ghz"]));

    let (_, body) = ctx.send(Method::GET, "/api/users/stats", None).await;
    assert_eq!(body["data"]["stats"]["totalConversions"], 3);
    assert_eq!(body["data"]["stats"]["successfulConversions"], 1);
    assert_eq!(body["data"]["usage"]["conversions"], 2);

    let (_, body) = ctx.send(Method::DELETE, "/api/history", None).await;
    assert_eq!(body["data"]["deleted"], 2);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_workflow_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/workflows",
            Some(json!({"name": "Bell pipeline", "steps": [{"type": "convert", "name": "Convert"}]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "draft");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = ctx
        .send(Method::POST, &format!("/api/workflows/{}/run", id), None)
        .await;
    assert_eq!(body["data"]["status"], "running");
    assert!(body["data"]["lastRunAt"].is_string());

    let (other, other_token) = ctx.other_user().await.unwrap();
    let (status, _) = send(
        &ctx.app,
        Method::GET,
        &format!("/api/workflows/{}", id),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, templates) = ctx.send(Method::GET, "/api/workflows/templates", None).await;
    let template_id = templates["data"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/api/workflows/templates/{}/use", template_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["templateId"], template_id.as_str());

    let (_, body) = ctx.send(Method::GET, "/api/workflows", None).await;
    assert_eq!(body["data"]["pagination"]["total"], 2);

    let (status, _) = ctx
        .send(Method::DELETE, &format!("/api/workflows?id={}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(Method::GET, &format!("/api/workflows/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(other.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_data_file_views() {
    let ctx = TestContext::new().await.unwrap();

    let stored = ctx
        .state
        .uploads
        .save("runs.csv", b"backend,shots\naer,1024\n\"ion, trap\",2048\n")
        .await
        .unwrap();

    let (status, body) = send(
        &ctx.app,
        Method::POST,
        "/api/qdata-clean/upload",
        Some(&ctx.token),
        Some(json!({
            "fileName": stored.file_name,
            "originalName": "runs.csv",
            "filePath": stored.file_path,
            "fileSize": stored.file_size,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["metadata"]["recordCount"], 2);
    assert_eq!(body["data"]["fileType"], "csv");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = ctx
        .send(Method::GET, &format!("/api/qdata-clean/files/{}/data", id), None)
        .await;
    assert_eq!(body["data"]["totalRows"], 2);
    assert_eq!(body["data"]["rows"][1]["backend"], "ion, trap");

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/qdata-clean/files/{}/export?format=xlsx", id))
                .header(header::AUTHORIZATION, format!("Bearer {}", ctx.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"runs.xlsx\""
    );

    let (_, body) = ctx
        .send(
            Method::GET,
            &format!("/api/qdata-clean/files/{}/export-chart?format=json", id),
            None,
        )
        .await;
    assert_eq!(body["data"]["labels"], json!(["aer", "ion, trap"]));
    assert_eq!(body["data"]["datasets"][0]["label"], "shots");

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/api/qdata-clean/files/{}/process", id),
            Some(json!({"options": {"dropNulls": true}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["options"]["dropNulls"], true);

    tokio::fs::remove_file(&stored.file_path).await.unwrap();
    let (status, _) = ctx
        .send(Method::DELETE, &format!("/api/qdata-clean/files/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_anonymous_file_is_read_only() {
    let ctx = TestContext::new().await.unwrap();

    let stored = ctx
        .state
        .uploads
        .save("shared.csv", b"qubit,error\n0,0.01\n")
        .await
        .unwrap();

    let (status, body) = send(
        &ctx.app,
        Method::POST,
        "/api/qdata-clean/upload",
        None,
        Some(json!({
            "fileName": stored.file_name,
            "originalName": "shared.csv",
            "fileSize": stored.file_size,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["data"]["userId"].is_null());
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .send(Method::GET, &format!("/api/qdata-clean/files/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(Method::DELETE, &format!("/api/qdata-clean/files/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
    assert!(tokio::fs::try_exists(&stored.file_path).await.unwrap());

    let (status, _) = ctx
        .send(Method::GET, &format!("/api/qdata-clean/files/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    sqlx::query("DELETE FROM data_files WHERE id = $1::uuid")
        .bind(&id)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_health_reports_database() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(&ctx.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}
