/// Integration tests for the API surface
///
/// These requests go through the real router, middleware stack, and error
/// envelope. They cover the paths that fail before any query executes:
/// authentication, request validation, and parameter parsing.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use common::{auth_header, body_json, test_app, TEST_JWT_SECRET};
use serde_json::json;
use taskmate_shared::auth::jwt::{create_token, Claims};
use tower::ServiceExt as _;
use uuid::Uuid;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_authed(uri: &str, header: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", header)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = test_app();

    let response = app.oneshot(get("/api/tasks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing authorization header");
}

#[tokio::test]
async fn test_non_bearer_header_rejected() {
    let app = test_app();

    let response = app
        .oneshot(get_authed("/api/tasks", "Basic dXNlcjpwYXNz"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Expected Bearer token");
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = test_app();

    let response = app
        .oneshot(get_authed("/api/tasks", "Bearer not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = test_app();

    let claims = Claims::with_expiration(Uuid::new_v4(), Duration::hours(-2));
    let token = create_token(&claims, TEST_JWT_SECRET).unwrap();

    let response = app
        .oneshot(get_authed("/api/tasks", &format!("Bearer {token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Token expired");
}

#[tokio::test]
async fn test_token_signed_with_wrong_secret_rejected() {
    let app = test_app();

    let token = create_token(
        &Claims::new(Uuid::new_v4()),
        "some-other-secret-key-32-bytes-long!!",
    )
    .unwrap();

    let response = app
        .oneshot(get_authed("/api/tasks", &format!("Bearer {token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/api/auth/signup",
            json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "not-an-email",
                "password": "SecureP@ss123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid email format");
}

#[tokio::test]
async fn test_signup_rejects_weak_password() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/api/auth/signup",
            json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane@example.com",
                "password": "alllowercase1!"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "Password must contain at least one uppercase letter"
    );
}

#[tokio::test]
async fn test_signin_rejects_invalid_email_format() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/api/auth/signin",
            json!({"email": "nope", "password": "whatever"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_returns_success_envelope() {
    let app = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header("authorization", auth_header())
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Logged out successfully");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_task_list_rejects_unknown_status() {
    let app = test_app();

    let response = app
        .oneshot(get_authed("/api/tasks?status=Done", &auth_header()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid status value");
}

#[tokio::test]
async fn test_task_list_rejects_unknown_sort_column() {
    let app = test_app();

    let response = app
        .oneshot(get_authed("/api/tasks?sortBy=creatorId", &auth_header()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid sort column");
}

#[tokio::test]
async fn test_task_list_rejects_unknown_priority() {
    let app = test_app();

    let response = app
        .oneshot(get_authed("/api/tasks?priority=Critical", &auth_header()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid priority value");
}

#[tokio::test]
async fn test_task_report_rejects_malformed_project_id() {
    let app = test_app();

    let response = app
        .oneshot(get_authed(
            "/api/reports/tasks?projectId=not-a-uuid",
            &auth_header(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid project id");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app();

    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["status"].is_string());
    assert!(body["database"].is_string());
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    // Non-production config: no HSTS.
    assert!(headers.get("strict-transport-security").is_none());
}
