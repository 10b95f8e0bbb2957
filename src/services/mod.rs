pub mod activity;
pub mod announcement;
pub mod dashboard;
pub mod document;
pub mod employee;
pub mod schedule;
pub mod time_off;
pub mod user;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::database::repository::RepositoryError;
use crate::database::DatabaseError;
use crate::filter::error::FilterError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    InvalidFields {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Password hashing failed: {0}")]
    Password(String),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(err.into())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Filter(e) => ServiceError::Filter(e),
            RepositoryError::Database(e) => ServiceError::Database(e),
        }
    }
}

impl From<argon2::password_hash::Error> for ServiceError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ServiceError::Password(err.to_string())
    }
}

/// Collects per-field messages and turns them into one validation error
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn require(&mut self, field: &str, value: Option<&str>) {
        if value.map(str::trim).unwrap_or("").is_empty() {
            self.add(field, REQUIRED);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self, message: &str) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(ServiceError::InvalidFields {
            message: message.to_string(),
            field_errors: self.0,
        })
    }
}

pub const REQUIRED: &str = "This field is required.";

/// Current calendar date on the server
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Trim, and treat blank as absent
pub fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Escape `%`, `_` and `\` for use inside a LIKE pattern
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("jane.doe@example.com"));
        assert!(!is_valid_email("jane.doe@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@@example.com"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("jane@example.com."));
    }

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.require("email", Some("  "));
        errors.add("email", "Please enter a valid email address.");
        let err = errors.into_result("All required fields must be filled.").unwrap_err();
        match err {
            ServiceError::InvalidFields { message, field_errors } => {
                assert_eq!(message, "All required fields must be filled.");
                assert_eq!(field_errors["email"], REQUIRED);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
