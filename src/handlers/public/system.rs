// handlers/public/system.rs - GET / and GET /health

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

/// GET / - Service descriptor
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Employee Portal API",
            "version": version,
            "description": "Employee records, documents, time off, announcements and schedules",
            "endpoints": {
                "health": "/health (public)",
                "auth": "/auth/login, /auth/refresh (public - token acquisition)",
                "session": "/api/auth/* (protected)",
                "employees": "/api/employees[/:id] (protected)",
                "documents": "/api/documents[/:id] (protected)",
                "time_off": "/api/time-off[/:id] (protected)",
                "announcements": "/api/announcements[/:id] (protected)",
                "schedules": "/api/schedules[/:id] (protected)",
                "dashboard": "/api/dashboard/stats, /api/dashboard/me (protected)",
                "admin": "/api/admin/users (elevated, administrators only)"
            }
        }
    }))
}

/// GET /health - Database connectivity
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
