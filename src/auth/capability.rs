use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Portal roles, stored as the `user_role` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    HrManager,
    Employee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageEmployees,
    UploadDocuments,
    ApproveTimeOff,
    ManageAnnouncements,
    ManageUsers,
    ViewOwnProfile,
}

impl Role {
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Administrator => &[
                ManageEmployees,
                UploadDocuments,
                ApproveTimeOff,
                ManageAnnouncements,
                ManageUsers,
                ViewOwnProfile,
            ],
            Role::HrManager => &[
                ManageEmployees,
                UploadDocuments,
                ApproveTimeOff,
                ManageAnnouncements,
                ViewOwnProfile,
            ],
            Role::Employee => &[ViewOwnProfile],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::HrManager => "hr_manager",
            Role::Employee => "employee",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "administrator" | "admin" => Some(Role::Administrator),
            "hr_manager" | "hr-manager" | "hr" => Some(Role::HrManager),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page a user lands on after login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Landing {
    AdminDashboard,
    EmployeeDashboard,
}

pub fn landing_page(role: Role) -> Landing {
    if role.can(Capability::ManageEmployees) {
        Landing::AdminDashboard
    } else {
        Landing::EmployeeDashboard
    }
}

/// Every defined role may use the portal; deactivated accounts may not.
pub fn has_portal_access(role: Role, is_active: bool) -> bool {
    is_active && role.can(Capability::ViewOwnProfile)
}

/// An actor may read an employee's data when they manage employees or the
/// record is linked to their own account.
pub fn can_access_employee_data(role: Role, actor_id: Uuid, employee_user_id: Option<Uuid>) -> bool {
    role.can(Capability::ManageEmployees) || employee_user_id == Some(actor_id)
}

pub fn can_upload_documents_for_employee(role: Role) -> bool {
    role.can(Capability::UploadDocuments)
}

pub fn can_approve_time_off(role: Role) -> bool {
    role.can(Capability::ApproveTimeOff)
}

pub fn can_manage_announcements(role: Role) -> bool {
    role.can(Capability::ManageAnnouncements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_table() {
        assert!(Role::Administrator.can(Capability::ManageUsers));
        assert!(!Role::HrManager.can(Capability::ManageUsers));
        assert!(Role::HrManager.can(Capability::ApproveTimeOff));
        assert!(Role::HrManager.can(Capability::UploadDocuments));
        assert!(!Role::Employee.can(Capability::ManageEmployees));
        assert!(Role::Employee.can(Capability::ViewOwnProfile));
    }

    #[test]
    fn ownership_check() {
        let me = Uuid::new_v4();
        let someone = Uuid::new_v4();

        assert!(can_access_employee_data(Role::Employee, me, Some(me)));
        assert!(!can_access_employee_data(Role::Employee, me, Some(someone)));
        assert!(!can_access_employee_data(Role::Employee, me, None));
        assert!(can_access_employee_data(Role::HrManager, me, Some(someone)));
        assert!(can_access_employee_data(Role::Administrator, me, None));
    }

    #[test]
    fn landing_depends_on_management_capability() {
        assert_eq!(landing_page(Role::Administrator), Landing::AdminDashboard);
        assert_eq!(landing_page(Role::HrManager), Landing::AdminDashboard);
        assert_eq!(landing_page(Role::Employee), Landing::EmployeeDashboard);
    }

    #[test]
    fn inactive_users_have_no_access() {
        assert!(has_portal_access(Role::Employee, true));
        assert!(!has_portal_access(Role::Administrator, false));
    }

    #[test]
    fn parses_role_names() {
        assert_eq!(Role::parse("HR_Manager"), Some(Role::HrManager));
        assert_eq!(Role::parse("admin"), Some(Role::Administrator));
        assert_eq!(Role::parse("contractor"), None);
        assert_eq!(serde_json::to_value(Role::HrManager).unwrap(), "hr_manager");
    }
}
