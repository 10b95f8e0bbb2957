//! Document upload and download against a real database; skipped unless EP_TEST_DATABASE_URL is set.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

use common::{call, call_raw, database_app, get, nonce, seeded_employee, seeded_user, send_json};
use employee_portal::auth::Role;

const BOUNDARY: &str = "ep-upload-boundary";
const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

fn upload_request(token: &str, fields: &[(&str, &str)], file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", BOUNDARY, name, value)
                .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
            BOUNDARY, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/documents")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn downloads_are_limited_to_the_owner_and_live_documents() {
    let storage = tempfile::tempdir().unwrap();
    std::env::set_var("STORAGE_ROOT", storage.path());

    let Some(app) = database_app().await else {
        eprintln!("EP_TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, hr_token) = seeded_user(Role::HrManager).await;
    let (owner, owner_token) = seeded_user(Role::Employee).await;
    let employee = seeded_employee(&owner, "Finance").await;
    let (other, other_token) = seeded_user(Role::Employee).await;
    seeded_employee(&other, "Finance").await;

    // Employees cannot upload
    let employee_id = employee.id.to_string();
    let (status, _) = call(
        &app,
        upload_request(
            &owner_token,
            &[("employee_id", employee_id.as_str()), ("document_type", "paystub")],
            "pay.pdf",
            PDF,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Non-PDF content is refused
    let upload_nonce = nonce(&app, &hr_token, "upload_document").await;
    let fields = [
        ("employee_id", employee_id.as_str()),
        ("document_type", "paystub"),
        ("year", "2024"),
        ("nonce", upload_nonce.as_str()),
    ];
    let (status, body) = call(&app, upload_request(&hr_token, &fields, "pay.pdf", b"GIF89a")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["message"], "Invalid file type. Only PDF files are allowed.");

    let (status, body) = call(&app, upload_request(&hr_token, &fields, "pay stub.pdf", PDF)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["document_type"], "paystub");
    assert!(body["data"].get("file_path").is_none());
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let download = format!("/api/documents/{}/download", id);

    let (status, headers, bytes) = call_raw(&app, get(&download, Some(&owner_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().contains("pay-stub.pdf"));
    assert_eq!(&bytes[..], PDF);

    let (status, body) = call(&app, get(&download, Some(&other_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Insufficient permissions.");

    // Soft delete hides the document from everyone
    let delete_nonce = nonce(&app, &hr_token, "delete_document").await;
    let (status, _) = call(
        &app,
        send_json("DELETE", &format!("/api/documents/{}", id), Some(&hr_token), Some(&delete_nonce), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, get(&download, Some(&owner_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Document not found.");

    let (status, _) = call(&app, get(&download, Some(&hr_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
