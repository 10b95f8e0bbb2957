pub mod auth;
pub mod client;
pub mod nonce;
pub mod response;
pub mod validate_user;

pub use auth::{jwt_auth_middleware, require_admin_middleware, AuthUser};
pub use client::ClientInfo;
pub use nonce::{require_nonce, require_nonce_value, NONCE_HEADER};
pub use response::{ApiResponse, ApiResult};
pub use validate_user::{validate_user_middleware, CurrentUser};
