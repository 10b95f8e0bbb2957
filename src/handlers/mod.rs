// handlers/mod.rs - Three-tier handler layout
//
// Public (no auth) → Protected (JWT + live user check) → Elevated (ManageUsers)

pub mod elevated;  // /api/admin/*
pub mod protected; // /api/*
pub mod public;    // /, /health, /auth/*

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Fallback for unknown routes, in the API error envelope
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Route not found",
            "code": "NOT_FOUND"
        })),
    )
        .into_response()
}
