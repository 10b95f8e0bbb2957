mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{call, get, offline_app, send_json};

#[tokio::test]
async fn root_describes_the_service() {
    let app = offline_app().await;
    let (status, body) = call(&app, get("/", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Employee Portal API");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_reports_unavailable_database() {
    let app = offline_app().await;
    let (status, body) = call(&app, get("/health", None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(body["data"]["status"], "degraded");
}

#[tokio::test]
async fn unknown_routes_use_error_envelope() {
    let app = offline_app().await;
    let (status, body) = call(&app, get("/nope", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = offline_app().await;
    let request = send_json("POST", "/auth/login", None, None, &json!({ "username": "  ", "password": "x" }));
    let (status, body) = call(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username and password are required.");
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn refresh_rejects_forged_tokens() {
    let app = offline_app().await;
    let request = send_json("POST", "/auth/refresh", None, None, &json!({ "token": "not.a.jwt" }));
    let (status, body) = call(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}
