// handlers/public/auth/mod.rs - Token acquisition

use serde::Serialize;

use crate::auth::capability::{landing_page, Landing};
use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::models::User;
use crate::error::ApiError;

pub mod login;   // POST /auth/login
pub mod refresh; // POST /auth/refresh

pub use login::login_post;
pub use refresh::refresh_post;

/// Body returned by login and refresh
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    /// Seconds
    pub expires_in: u64,
    pub user: User,
    pub landing: Landing,
    pub force_password_reset: bool,
}

impl TokenResponse {
    pub fn issue(user: User) -> Result<Self, ApiError> {
        let token = generate_jwt(Claims::new(user.id, user.username.clone(), user.role))?;
        Ok(Self {
            token,
            expires_in: config::config().security.jwt_expiry_hours * 3600,
            landing: landing_page(user.role),
            force_password_reset: user.force_password_reset,
            user,
        })
    }
}
