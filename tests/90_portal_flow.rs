//! End-to-end flow against a real database; skipped unless EP_TEST_DATABASE_URL is set.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{call, database_app, get, send_json};
use employee_portal::auth::Role;
use employee_portal::database::DatabaseManager;
use employee_portal::services::user::{NewUser, UserService};

const PASSWORD: &str = "Str0ng!Passw0rd";

#[tokio::test]
async fn admin_manages_an_employee() {
    let Some(app) = database_app().await else {
        eprintln!("EP_TEST_DATABASE_URL not set; skipping");
        return;
    };

    let suffix = Uuid::new_v4().simple().to_string()[..8].to_string();
    let username = format!("admin_{}", suffix);
    UserService::with_pool(DatabaseManager::pool().await.unwrap())
        .create(NewUser {
            username: Some(username.clone()),
            email: Some(format!("{}@example.com", username)),
            role: Some(Role::Administrator),
            password: Some(PASSWORD.into()),
            ..Default::default()
        })
        .await
        .unwrap();

    // Login
    let (status, body) = call(
        &app,
        send_json("POST", "/auth/login", None, None, &json!({ "username": username, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["landing"], "admin_dashboard");
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // Wrong password
    let (status, body) = call(
        &app,
        send_json("POST", "/auth/login", None, None, &json!({ "username": username, "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid username or password.");

    let employee = json!({
        "employee_id": format!("E-{}", suffix),
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": format!("grace.{}@example.com", suffix),
        "department": "Engineering"
    });

    // Missing nonce
    let (status, body) = call(&app, send_json("POST", "/api/employees", Some(&token), None, &employee)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Security check failed.");

    // Create with nonce
    let (_, body) = call(&app, get("/api/auth/nonce/save_employee", Some(&token))).await;
    let nonce = body["data"]["nonce"].as_str().unwrap().to_string();
    let (status, body) =
        call(&app, send_json("POST", "/api/employees", Some(&token), Some(&nonce), &employee)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["employee"]["id"].as_str().unwrap().to_string();

    // Duplicate employee code
    let (status, _) = call(&app, send_json("POST", "/api/employees", Some(&token), Some(&nonce), &employee)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Read back
    let (status, body) = call(&app, get(&format!("/api/employees/{}", id), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["last_name"], "Hopper");
    assert_eq!(body["data"]["status"], "active");

    // Search
    let (status, body) = call(&app, get(&format!("/api/employees?search=E-{}", suffix), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Partial update leaves the other fields alone
    let save = common::nonce(&app, &token, "save_employee").await;
    let (status, body) = call(
        &app,
        send_json("PUT", &format!("/api/employees/{}", id), Some(&token), Some(&save), &json!({ "phone": "555-0142" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["phone"], "555-0142");
    assert_eq!(body["data"]["department"], "Engineering");
    assert_eq!(body["data"]["last_name"], "Hopper");

    // Delete
    let (_, body) = call(&app, get("/api/auth/nonce/delete_employee", Some(&token))).await;
    let nonce = body["data"]["nonce"].as_str().unwrap().to_string();
    let (status, _) = call(
        &app,
        send_json("DELETE", &format!("/api/employees/{}", id), Some(&token), Some(&nonce), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, get(&format!("/api/employees/{}", id), Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Employee not found.");
}
