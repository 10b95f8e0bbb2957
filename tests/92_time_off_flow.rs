//! Time off decisions against a real database; skipped unless EP_TEST_DATABASE_URL is set.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Local};
use serde_json::json;

use common::{call, database_app, get, nonce, seeded_employee, seeded_user, send_json};
use employee_portal::auth::Role;

#[tokio::test]
async fn pending_requests_are_decided_once() {
    let Some(app) = database_app().await else {
        eprintln!("EP_TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (hr, hr_token) = seeded_user(Role::HrManager).await;
    let (staff, staff_token) = seeded_user(Role::Employee).await;
    let employee = seeded_employee(&staff, "Engineering").await;
    let (other, other_token) = seeded_user(Role::Employee).await;
    seeded_employee(&other, "Engineering").await;

    let start = Local::now().date_naive() + Duration::days(10);
    let submission = json!({
        "request_type": "vacation",
        "start_date": start,
        "end_date": start + Duration::days(2),
        "days_requested": 2.5,
        "reason": "Family visit"
    });

    let submit_nonce = nonce(&app, &staff_token, "time_off").await;
    let (status, body) =
        call(&app, send_json("POST", "/api/time-off", Some(&staff_token), Some(&submit_nonce), &submission)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["employee_id"], employee.id.to_string());
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Employees cannot decide requests
    let (status, _) = call(
        &app,
        send_json("POST", &format!("/api/time-off/{}/approve", id), Some(&staff_token), Some(&submit_nonce), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Other employees cannot read it
    let (status, _) = call(&app, get(&format!("/api/time-off/{}", id), Some(&other_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let decide = nonce(&app, &hr_token, "approve_time_off").await;
    let (status, body) = call(
        &app,
        send_json(
            "POST",
            &format!("/api/time-off/{}/approve", id),
            Some(&hr_token),
            Some(&decide),
            &json!({ "notes": "Enjoy" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["approved_by"], hr.id.to_string());

    // A second decision conflicts and leaves the first one in place
    let (status, body) = call(
        &app,
        send_json("POST", &format!("/api/time-off/{}/deny", id), Some(&hr_token), Some(&decide), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This request has already been processed.");

    let (status, body) = call(&app, get(&format!("/api/time-off/{}", id), Some(&staff_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");

    // Unknown requests are 404, not 409
    let missing = uuid::Uuid::new_v4();
    let (status, _) = call(
        &app,
        send_json("POST", &format!("/api/time-off/{}/deny", missing), Some(&hr_token), Some(&decide), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
