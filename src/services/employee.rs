use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{insert_user, NewUser};
use super::{clean, escape_like, is_valid_email, FieldErrors, ServiceError};
use crate::auth::Role;
use crate::database::models::{Employee, EmployeeStatus};
use crate::database::repository::Repository;
use crate::database::{DatabaseError, DatabaseManager};
use crate::filter::FilterData;

pub const EMPLOYEE_NOT_FOUND: &str = "Employee not found.";
pub const PROFILE_NOT_FOUND: &str = "Employee profile not found. Please contact HR.";
const REQUIRED_FIELDS: &str = "All required fields must be filled.";

/// Query parameters accepted by the employee list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeQuery {
    /// `all` (default) or one of the status values
    pub status: Option<String>,
    pub department: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl EmployeeQuery {
    pub fn to_filter(&self) -> Result<FilterData, ServiceError> {
        let mut conditions = Map::new();

        match clean(self.status.clone()).as_deref() {
            None | Some("all") => {}
            Some(status) => {
                let status = parse_status(status)?;
                conditions.insert("status".into(), json!(status));
            }
        }
        if let Some(department) = clean(self.department.clone()) {
            conditions.insert("department".into(), json!(department));
        }
        if let Some(search) = clean(self.search.clone()) {
            let pattern = format!("%{}%", escape_like(&search));
            conditions.insert(
                "$or".into(),
                json!([
                    { "first_name": { "$ilike": pattern } },
                    { "last_name": { "$ilike": pattern } },
                    { "email": { "$ilike": pattern } },
                    { "employee_id": { "$ilike": pattern } }
                ]),
            );
        }

        Ok(FilterData {
            where_clause: Some(Value::Object(conditions)),
            order: Some(json!("last_name asc, first_name asc")),
            limit: self.limit,
            offset: self.offset,
            ..Default::default()
        })
    }
}

fn parse_status(value: &str) -> Result<EmployeeStatus, ServiceError> {
    match value.to_ascii_lowercase().as_str() {
        "active" => Ok(EmployeeStatus::Active),
        "inactive" => Ok(EmployeeStatus::Inactive),
        "terminated" => Ok(EmployeeStatus::Terminated),
        other => Err(ServiceError::Validation(format!("Unknown employee status: {}", other))),
    }
}

/// Login account created together with an employee record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccount {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Body of employee create and update requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeInput {
    pub employee_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<Decimal>,
    pub status: Option<EmployeeStatus>,
    pub manager_id: Option<Uuid>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    /// Link to an existing user account
    pub user_id: Option<Uuid>,
    /// Update only: drop the link to the user account
    #[serde(default)]
    pub unlink_user: bool,
    /// Create a user account for the employee (create only)
    pub account: Option<NewAccount>,
}

/// Validated, trimmed employee fields ready to write
#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<Decimal>,
    pub status: EmployeeStatus,
    pub manager_id: Option<Uuid>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub user_id: Option<Uuid>,
}

impl EmployeeInput {
    /// Fill every field the update body left out with the stored value.
    /// An empty string still clears a text field; the account link only goes
    /// away through `unlink_user`.
    pub fn merged_over(self, current: &Employee) -> Self {
        let user_id = if self.unlink_user { None } else { self.user_id.or(current.user_id) };
        Self {
            employee_id: self.employee_id.or_else(|| Some(current.employee_id.clone())),
            first_name: self.first_name.or_else(|| Some(current.first_name.clone())),
            last_name: self.last_name.or_else(|| Some(current.last_name.clone())),
            email: self.email.or_else(|| Some(current.email.clone())),
            phone: self.phone.or_else(|| current.phone.clone()),
            department: self.department.or_else(|| current.department.clone()),
            position: self.position.or_else(|| current.position.clone()),
            hire_date: self.hire_date.or(current.hire_date),
            salary: self.salary.or(current.salary),
            status: self.status.or(Some(current.status)),
            manager_id: self.manager_id.or(current.manager_id),
            address: self.address.or_else(|| current.address.clone()),
            emergency_contact_name: self.emergency_contact_name.or_else(|| current.emergency_contact_name.clone()),
            emergency_contact_phone: self.emergency_contact_phone.or_else(|| current.emergency_contact_phone.clone()),
            user_id,
            unlink_user: self.unlink_user,
            account: self.account,
        }
    }

    pub fn validate(self) -> Result<(EmployeeRecord, Option<NewAccount>), ServiceError> {
        let employee_id = clean(self.employee_id);
        let first_name = clean(self.first_name);
        let last_name = clean(self.last_name);
        let email = clean(self.email);

        let mut errors = FieldErrors::new();
        errors.require("employee_id", employee_id.as_deref());
        errors.require("first_name", first_name.as_deref());
        errors.require("last_name", last_name.as_deref());
        errors.require("email", email.as_deref());
        let missing_required = !errors.is_empty();

        if let Some(email) = email.as_deref() {
            if !is_valid_email(email) {
                errors.add("email", "Please enter a valid email address.");
            }
        }
        if let Some(salary) = self.salary {
            if salary.is_sign_negative() && !salary.is_zero() {
                errors.add("salary", "Salary cannot be negative.");
            }
        }
        errors.into_result(if missing_required { REQUIRED_FIELDS } else { "Please correct the highlighted fields." })?;

        let (Some(employee_id), Some(first_name), Some(last_name), Some(email)) =
            (employee_id, first_name, last_name, email)
        else {
            return Err(ServiceError::Validation(REQUIRED_FIELDS.to_string()));
        };

        let record = EmployeeRecord {
            employee_id,
            first_name,
            last_name,
            email,
            phone: clean(self.phone),
            department: clean(self.department),
            position: clean(self.position),
            hire_date: self.hire_date,
            salary: self.salary,
            status: self.status.unwrap_or_default(),
            manager_id: self.manager_id,
            address: clean(self.address),
            emergency_contact_name: clean(self.emergency_contact_name),
            emergency_contact_phone: clean(self.emergency_contact_phone),
            user_id: self.user_id,
        };
        Ok((record, self.account))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedEmployee {
    pub employee: Employee,
    /// Present when a login account was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<super::user::CreatedUser>,
}

pub struct EmployeeService {
    pool: PgPool,
}

impl EmployeeService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self::with_pool(DatabaseManager::pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &EmployeeQuery) -> Result<Vec<Employee>, ServiceError> {
        Ok(Repository::<Employee>::new(self.pool.clone())
            .select_any(query.to_filter()?)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Employee, ServiceError> {
        Repository::<Employee>::new(self.pool.clone())
            .select_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(EMPLOYEE_NOT_FOUND.to_string()))
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Employee>, ServiceError> {
        let filter = FilterData {
            where_clause: Some(json!({ "user_id": user_id })),
            ..Default::default()
        };
        Ok(Repository::<Employee>::new(self.pool.clone()).select_one(filter).await?)
    }

    /// The employee record linked to `user_id`, or the "contact HR" error
    pub async fn profile_for_user(&self, user_id: Uuid) -> Result<Employee, ServiceError> {
        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(PROFILE_NOT_FOUND.to_string()))
    }

    /// Insert an employee, optionally creating its login account in the same transaction
    pub async fn create(&self, input: EmployeeInput) -> Result<CreatedEmployee, ServiceError> {
        let (mut record, account) = input.validate()?;
        let mut tx = self.pool.begin().await?;

        let created_account = match account {
            Some(account) => {
                if record.user_id.is_some() {
                    return Err(ServiceError::Validation(
                        "Provide either an existing user or a new account, not both.".to_string(),
                    ));
                }
                let created = insert_user(
                    &mut tx,
                    NewUser {
                        username: account.username,
                        email: Some(record.email.clone()),
                        display_name: Some(format!("{} {}", record.first_name, record.last_name)),
                        role: account.role,
                        password: account.password,
                        force_password_reset: false,
                    },
                )
                .await?;
                record.user_id = Some(created.user.id);
                Some(created)
            }
            None => None,
        };

        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (
                user_id, employee_id, first_name, last_name, email, phone, department, position,
                hire_date, salary, status, manager_id, address, emergency_contact_name, emergency_contact_phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(&record.employee_id)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.department)
        .bind(&record.position)
        .bind(record.hire_date)
        .bind(record.salary)
        .bind(record.status)
        .bind(record.manager_id)
        .bind(&record.address)
        .bind(&record.emergency_contact_name)
        .bind(&record.emergency_contact_phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_conflict(e.into()))?;

        tx.commit().await?;
        tracing::info!("Created employee {} ({})", employee.employee_id, employee.id);
        Ok(CreatedEmployee { employee, account: created_account })
    }

    /// Partial update: fields missing from `input` keep their stored values
    pub async fn update(&self, id: Uuid, input: EmployeeInput) -> Result<Employee, ServiceError> {
        if input.account.is_some() {
            return Err(ServiceError::Validation("Accounts can only be created with a new employee.".to_string()));
        }
        if input.unlink_user && input.user_id.is_some() {
            return Err(ServiceError::Validation("Provide either a user to link or unlink_user, not both.".to_string()));
        }
        let current = self.get(id).await?;
        let (record, _) = input.merged_over(&current).validate()?;
        if record.manager_id == Some(id) {
            return Err(ServiceError::Validation("An employee cannot be their own manager.".to_string()));
        }

        sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees SET
                user_id = $2, employee_id = $3, first_name = $4, last_name = $5, email = $6,
                phone = $7, department = $8, position = $9, hire_date = $10, salary = $11,
                status = $12, manager_id = $13, address = $14, emergency_contact_name = $15,
                emergency_contact_phone = $16, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(record.user_id)
        .bind(&record.employee_id)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.department)
        .bind(&record.position)
        .bind(record.hire_date)
        .bind(record.salary)
        .bind(record.status)
        .bind(record.manager_id)
        .bind(&record.address)
        .bind(&record.emergency_contact_name)
        .bind(&record.emergency_contact_phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_conflict(e.into()))?
        .ok_or_else(|| ServiceError::NotFound(EMPLOYEE_NOT_FOUND.to_string()))
    }

    /// Hard delete. Refused while any document (active or not) is on file.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let (documents,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE employee_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if documents > 0 {
            return Err(ServiceError::Conflict(
                "Employee has documents on file and cannot be deleted. Mark the employee terminated instead."
                    .to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(EMPLOYEE_NOT_FOUND.to_string()));
        }
        tracing::info!("Deleted employee {}", id);
        Ok(())
    }
}

fn unique_conflict(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::UniqueViolation(constraint) if constraint.contains("user_id") => {
            ServiceError::Conflict("That user account is already linked to another employee.".to_string())
        }
        DatabaseError::UniqueViolation(_) => {
            ServiceError::Conflict("An employee with that employee ID already exists.".to_string())
        }
        DatabaseError::ForeignKeyViolation(_) => {
            ServiceError::Validation("The linked user or manager does not exist.".to_string())
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> EmployeeInput {
        EmployeeInput {
            employee_id: Some(" EMP-001 ".into()),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            department: Some("  ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_input_is_trimmed() {
        let (record, account) = input().validate().unwrap();
        assert_eq!(record.employee_id, "EMP-001");
        assert_eq!(record.department, None);
        assert_eq!(record.status, EmployeeStatus::Active);
        assert!(account.is_none());
    }

    #[test]
    fn missing_required_fields() {
        let err = EmployeeInput { first_name: None, email: None, ..input() }.validate().unwrap_err();
        match err {
            ServiceError::InvalidFields { message, field_errors } => {
                assert_eq!(message, REQUIRED_FIELDS);
                assert!(field_errors.contains_key("first_name"));
                assert!(field_errors.contains_key("email"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_email_and_salary() {
        let err = EmployeeInput {
            email: Some("ada-at-example".into()),
            salary: Some(Decimal::new(-100, 0)),
            ..input()
        }
        .validate()
        .unwrap_err();
        match err {
            ServiceError::InvalidFields { field_errors, .. } => {
                assert!(field_errors.contains_key("email"));
                assert!(field_errors.contains_key("salary"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    fn stored() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            employee_id: "EMP-001".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: Some("555-0100".into()),
            department: Some("Engineering".into()),
            position: Some("Analyst".into()),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 6),
            salary: Some(Decimal::new(85_000, 0)),
            status: EmployeeStatus::Inactive,
            manager_id: None,
            address: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn partial_update_keeps_stored_fields() {
        let current = stored();
        let body = EmployeeInput { phone: Some("555-0199".into()), ..Default::default() };
        let (record, _) = body.merged_over(&current).validate().unwrap();

        assert_eq!(record.phone.as_deref(), Some("555-0199"));
        assert_eq!(record.user_id, current.user_id);
        assert_eq!(record.department.as_deref(), Some("Engineering"));
        assert_eq!(record.salary, Some(Decimal::new(85_000, 0)));
        assert_eq!(record.status, EmployeeStatus::Inactive);
        assert_eq!(record.employee_id, "EMP-001");
    }

    #[test]
    fn empty_strings_clear_and_unlink_drops_the_account() {
        let current = stored();
        let body = EmployeeInput { department: Some("".into()), unlink_user: true, ..Default::default() };
        let (record, _) = body.merged_over(&current).validate().unwrap();
        assert_eq!(record.department, None);
        assert_eq!(record.user_id, None);
        assert_eq!(record.position.as_deref(), Some("Analyst"));

        let blank_name = EmployeeInput { first_name: Some(" ".into()), ..Default::default() };
        assert!(blank_name.merged_over(&current).validate().is_err());
    }

    #[test]
    fn unlink_body_deserializes_with_default_flag() {
        let body: EmployeeInput = serde_json::from_value(json!({ "phone": "1" })).unwrap();
        assert!(!body.unlink_user);
        let body: EmployeeInput = serde_json::from_value(json!({ "unlink_user": true })).unwrap();
        assert!(body.unlink_user);
    }

    #[test]
    fn list_filter_defaults_to_all_statuses() {
        let filter = EmployeeQuery::default().to_filter().unwrap();
        assert_eq!(filter.where_clause, Some(json!({})));

        let filter = EmployeeQuery {
            status: Some("terminated".into()),
            search: Some("o'ne%".into()),
            ..Default::default()
        }
        .to_filter()
        .unwrap();
        let where_clause = filter.where_clause.unwrap();
        assert_eq!(where_clause["status"], "terminated");
        assert_eq!(where_clause["$or"][0]["first_name"]["$ilike"], "%o'ne\\%%");

        assert!(EmployeeQuery { status: Some("retired".into()), ..Default::default() }.to_filter().is_err());
    }

    #[test]
    fn list_filter_renders_through_employee_columns() {
        use crate::database::Table;
        use crate::filter::Filter;

        let data = EmployeeQuery {
            status: Some("active".into()),
            department: Some("Sales".into()),
            search: Some("ann".into()),
            ..Default::default()
        }
        .to_filter()
        .unwrap();
        let mut filter = Filter::new(Employee::NAME, Employee::COLUMNS).unwrap();
        filter.assign(data).unwrap();
        let sql = filter.to_sql().unwrap();
        assert!(sql.query.contains("\"status\"::text = $6"));
        assert!(sql.query.ends_with("ORDER BY \"last_name\" ASC, \"first_name\" ASC"));
        assert_eq!(sql.params.len(), 6);
    }
}
