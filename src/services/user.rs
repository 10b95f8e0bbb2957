use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::activity::record_activity;
use super::{clean, is_valid_email, FieldErrors, ServiceError};
use crate::auth::capability::has_portal_access;
use crate::auth::password::{
    check_strength, generate_secure_password, hash_password, verify_absent_user, verify_password,
    DEFAULT_GENERATED_LENGTH,
};
use crate::auth::Role;
use crate::database::models::{activity, User};
use crate::database::repository::Repository;
use crate::database::{DatabaseError, DatabaseManager};
use crate::filter::FilterData;
use crate::middleware::ClientInfo;

pub const CREDENTIALS_REQUIRED: &str = "Username and password are required.";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";
pub const ACCOUNT_DISABLED: &str = "Your account has been deactivated.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
    /// Generated when absent
    pub password: Option<String>,
    #[serde(default)]
    pub force_password_reset: bool,
}

/// A newly created account; `generated_password` is only set when one was generated
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUser {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self::with_pool(DatabaseManager::pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
        Ok(Repository::<User>::new(self.pool.clone()).select_id(id).await?)
    }

    /// Look a user up by username or email, case-insensitively
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE lower(username) = lower($1) OR lower(email) = lower($1) LIMIT 1",
        )
        .bind(login.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Verify credentials and record the login
    pub async fn authenticate(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        client: &ClientInfo,
    ) -> Result<User, ServiceError> {
        let username = username.map(str::trim).unwrap_or("");
        let password = password.unwrap_or("");
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(CREDENTIALS_REQUIRED.to_string()));
        }

        let verified = match self.find_by_login(username).await? {
            Some(user) if verify_password(password, &user.password_hash) => Some(user),
            Some(_) => None,
            None => {
                verify_absent_user(password);
                None
            }
        };
        let Some(user) = verified else {
            tracing::warn!("Failed login for '{}' from {}", username, client.ip);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !has_portal_access(user.role, user.is_active) {
            tracing::warn!("Login refused for deactivated user '{}'", user.username);
            return Err(ServiceError::Forbidden(ACCOUNT_DISABLED.to_string()));
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET last_login_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;
        record_activity(&self.pool, user.id, activity::LOGIN, None, client).await?;

        tracing::info!("User '{}' logged in", user.username);
        Ok(user)
    }

    pub async fn record_logout(&self, user_id: Uuid, client: &ClientInfo) -> Result<(), ServiceError> {
        sqlx::query("UPDATE users SET last_logout_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        record_activity(&self.pool, user_id, activity::LOGOUT, None, client).await
    }

    pub async fn record_refresh(&self, user_id: Uuid, client: &ClientInfo) -> Result<(), ServiceError> {
        record_activity(&self.pool, user_id, activity::TOKEN_REFRESH, None, client).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        client: &ClientInfo,
    ) -> Result<(), ServiceError> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        if !verify_password(current_password, &user.password_hash) {
            let mut errors = FieldErrors::new();
            errors.add("current_password", "Current password is incorrect.");
            return errors.into_result("Current password is incorrect.");
        }
        validate_new_password(new_password)?;

        self.store_password(user_id, new_password, false).await?;
        record_activity(&self.pool, user_id, activity::PASSWORD_CHANGE, None, client).await?;
        tracing::info!("User '{}' changed their password", user.username);
        Ok(())
    }

    /// Operator reset: no current-password check, no strength check, sets the force-reset flag
    pub async fn reset_password(&self, login: &str, new_password: &str) -> Result<User, ServiceError> {
        let user = self
            .find_by_login(login)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;
        self.store_password(user.id, new_password, true).await?;
        Ok(user)
    }

    async fn store_password(&self, user_id: Uuid, password: &str, force_reset: bool) -> Result<(), ServiceError> {
        let hash = hash_password(password)?;
        sqlx::query(
            "UPDATE users SET password_hash = $2, force_password_reset = $3, updated_at = now() WHERE id = $1",
        )
        .bind(user_id)
        .bind(hash)
        .bind(force_reset)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create(&self, new_user: NewUser) -> Result<CreatedUser, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        let created = insert_user(&mut conn, new_user).await?;
        tracing::info!("Created user '{}' ({})", created.user.username, created.user.role);
        Ok(created)
    }

    pub async fn list(&self, filter: FilterData) -> Result<Vec<User>, ServiceError> {
        let filter = FilterData {
            order: filter.order.or(Some(json!("username asc"))),
            ..filter
        };
        Ok(Repository::<User>::new(self.pool.clone()).select_any(filter).await?)
    }

    pub async fn force_password_reset(&self, user_id: Uuid, client: &ClientInfo) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET force_password_reset = TRUE, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;
        record_activity(&self.pool, user_id, activity::PASSWORD_RESET_FORCED, None, client).await?;
        Ok(user)
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>("UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING *")
            .bind(user_id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))
    }

    pub async fn set_active(&self, user_id: Uuid, active: bool) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>("UPDATE users SET is_active = $2, updated_at = now() WHERE id = $1 RETURNING *")
            .bind(user_id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))
    }
}

/// Reject passwords scoring below "strong"
pub fn validate_new_password(password: &str) -> Result<(), ServiceError> {
    let strength = check_strength(password);
    if strength.is_strong {
        return Ok(());
    }
    let mut errors = FieldErrors::new();
    errors.add("new_password", strength.feedback.join(" "));
    errors.into_result("Password is not strong enough.")
}

/// Validate and insert a user on an existing connection (shared with employee creation)
pub(crate) async fn insert_user(conn: &mut PgConnection, new_user: NewUser) -> Result<CreatedUser, ServiceError> {
    let username = clean(new_user.username);
    let email = clean(new_user.email);

    let mut errors = FieldErrors::new();
    errors.require("username", username.as_deref());
    errors.require("email", email.as_deref());
    if let Some(name) = username.as_deref() {
        if name.len() > 60 || !name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@')) {
            errors.add("username", "Usernames may only contain letters, numbers and . _ - @");
        }
    }
    if let Some(email) = email.as_deref() {
        if !is_valid_email(email) {
            errors.add("email", "Please enter a valid email address.");
        }
    }
    errors.into_result("All required fields must be filled.")?;

    let (Some(username), Some(email)) = (username, email) else {
        return Err(ServiceError::Validation("All required fields must be filled.".to_string()));
    };

    let (password, generated_password) = match clean(new_user.password) {
        Some(password) => (password, None),
        None => {
            let generated = generate_secure_password(DEFAULT_GENERATED_LENGTH);
            (generated.clone(), Some(generated))
        }
    };
    let hash = hash_password(&password)?;
    let display_name = clean(new_user.display_name).unwrap_or_else(|| username.clone());
    let role = new_user.role.unwrap_or(Role::Employee);

    let result = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, display_name, password_hash, role, force_password_reset)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&username)
    .bind(&email)
    .bind(&display_name)
    .bind(hash)
    .bind(role)
    .bind(new_user.force_password_reset || generated_password.is_some())
    .fetch_one(&mut *conn)
    .await;

    match result {
        Ok(user) => Ok(CreatedUser { user, generated_password }),
        Err(e) => match DatabaseError::from(e) {
            DatabaseError::UniqueViolation(_) => {
                Err(ServiceError::Conflict("A user with that username or email already exists.".to_string()))
            }
            other => Err(other.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_passwords_are_rejected_with_feedback() {
        match validate_new_password("password").unwrap_err() {
            ServiceError::InvalidFields { field_errors, .. } => {
                let feedback = &field_errors["new_password"];
                assert!(feedback.contains("uppercase"));
                assert!(feedback.contains("number"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(validate_new_password("Winter-2025").is_ok());
    }
}
