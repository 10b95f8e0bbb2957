use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::config;
use crate::handlers::{self, elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin_middleware, validate_user_middleware, NONCE_HEADER};

/// Build the full application router
pub fn app() -> Router {
    let max_body = config().api.max_request_size_bytes;

    let router = Router::new()
        // Tier 1: public
        .merge(public_routes())
        // Tier 2: protected
        .merge(protected_routes())
        // Tier 3: elevated
        .merge(elevated_routes())
        .fallback(handlers::not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors_layer());

    if config().api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router {
    Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/auth/login", post(public::auth::login_post))
        .route("/auth/refresh", post(public::auth::refresh_post))
}

fn protected_routes() -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(employee_routes())
        .merge(document_routes())
        .merge(time_off_routes())
        .merge(announcement_routes())
        .merge(schedule_routes())
        .merge(dashboard_routes())
        // Layers run bottom-up: the JWT is decoded before the user is re-validated
        .layer(middleware::from_fn(validate_user_middleware))
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn elevated_routes() -> Router {
    use elevated::users;

    Router::new()
        .route("/api/admin/users", get(users::list).post(users::create))
        .route("/api/admin/users/:id/force-reset", post(users::force_reset))
        .route("/api/admin/users/:id/role", put(users::set_role))
        .route("/api/admin/users/:id/active", put(users::set_active))
        .layer(middleware::from_fn(require_admin_middleware))
        .layer(middleware::from_fn(validate_user_middleware))
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn auth_routes() -> Router {
    use axum::routing::delete;
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/auth/session", delete(auth::session_delete))
        .route("/api/auth/password", put(auth::password_put))
        .route("/api/auth/activity", get(auth::activity_get))
        .route("/api/auth/nonce/:action", get(auth::nonce_get))
}

fn employee_routes() -> Router {
    use protected::employees;

    Router::new()
        .route("/api/employees", get(employees::list).post(employees::create))
        .route("/api/employees/me", get(employees::me))
        .route(
            "/api/employees/:id",
            get(employees::get).put(employees::update).delete(employees::delete),
        )
        .route("/api/employees/:id/documents", get(employees::documents))
}

fn document_routes() -> Router {
    use axum::routing::delete;
    use protected::documents;

    Router::new()
        .route("/api/documents", get(documents::list).post(documents::upload))
        .route("/api/documents/recent", get(documents::recent))
        .route("/api/documents/:id", delete(documents::delete))
        .route("/api/documents/:id/download", get(documents::download))
}

fn time_off_routes() -> Router {
    use protected::time_off;

    Router::new()
        .route("/api/time-off", get(time_off::list).post(time_off::submit))
        .route("/api/time-off/:id", get(time_off::get))
        .route("/api/time-off/:id/approve", post(time_off::approve))
        .route("/api/time-off/:id/deny", post(time_off::deny))
}

fn announcement_routes() -> Router {
    use protected::announcements;

    Router::new()
        .route("/api/announcements", get(announcements::list).post(announcements::create))
        .route(
            "/api/announcements/:id",
            get(announcements::get)
                .put(announcements::update)
                .delete(announcements::delete),
        )
}

fn schedule_routes() -> Router {
    use protected::schedules;

    Router::new()
        .route("/api/schedules", get(schedules::list).post(schedules::create))
        .route(
            "/api/schedules/:id",
            get(schedules::get).put(schedules::update).delete(schedules::delete),
        )
}

fn dashboard_routes() -> Router {
    use protected::dashboard;

    Router::new()
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/dashboard/me", get(dashboard::me))
}

/// CORS for the configured front-end origins
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(NONCE_HEADER),
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
}
