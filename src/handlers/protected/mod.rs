// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: bearer JWT, user re-read from the store on every request
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware → validate_user_middleware

pub mod announcements;
pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod employees;
pub mod schedules;
pub mod time_off;

use uuid::Uuid;

use crate::auth::capability::can_access_employee_data;
use crate::database::models::Employee;
use crate::error::ApiError;
use crate::middleware::auth::INSUFFICIENT_PERMISSIONS;
use crate::middleware::AuthUser;
use crate::services::employee::EmployeeService;

/// Ownership check: managers see everyone, employees only their own record
pub(crate) fn ensure_employee_access(user: &AuthUser, employee: &Employee) -> Result<(), ApiError> {
    if can_access_employee_data(user.role, user.user_id, employee.user_id) {
        return Ok(());
    }
    tracing::warn!(
        "Forbidden: '{}' tried to read employee {} ({})",
        user.username,
        employee.employee_id,
        employee.id
    );
    Err(ApiError::forbidden(INSUFFICIENT_PERMISSIONS))
}

/// The caller's own employee record id (404 when none is linked)
pub(crate) async fn own_employee_id(user: &AuthUser) -> Result<Uuid, ApiError> {
    let profile = EmployeeService::new().await?.profile_for_user(user.user_id).await?;
    Ok(profile.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use chrono::Utc;

    fn employee(user_id: Option<Uuid>) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            user_id,
            employee_id: "E-100".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
            department: Some("Engineering".into()),
            position: None,
            hire_date: None,
            salary: None,
            status: Default::default(),
            manager_id: None,
            address: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(role: Role) -> AuthUser {
        AuthUser { user_id: Uuid::new_v4(), username: "u".into(), role }
    }

    #[test]
    fn employees_only_see_their_own_record() {
        let me = user(Role::Employee);
        assert!(ensure_employee_access(&me, &employee(Some(me.user_id))).is_ok());
        let err = ensure_employee_access(&me, &employee(Some(Uuid::new_v4()))).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(ensure_employee_access(&me, &employee(None)).is_err());
    }

    #[test]
    fn managers_see_everyone() {
        assert!(ensure_employee_access(&user(Role::HrManager), &employee(None)).is_ok());
        assert!(ensure_employee_access(&user(Role::Administrator), &employee(Some(Uuid::new_v4()))).is_ok());
    }
}
