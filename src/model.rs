//! Records returned by the API.
//!
//! Employees and roles are read back with their permission document already
//! resolved, so callers never see the raw stored JSON.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::permission::PermissionDocument;

/// Department lookup entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

/// Role template with its resolved permission document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub permissions: PermissionDocument,
    pub employee_count: i64,
    pub created_at: Option<String>,
}

/// Account state. Only active accounts may sign in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    /// Stored text. Anything other than `Active` reads as inactive.
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("Active") => EmployeeStatus::Active,
            _ => EmployeeStatus::Inactive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeStatus::Active => "Active",
            EmployeeStatus::Inactive => "Inactive",
        }
    }
}

/// Employee with department, role and inherited permissions resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub full_name: String,
    pub employee_id: String,
    pub email: String,
    pub mobile: Option<String>,
    /// The role's department, or the employee's own for role-less rows.
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub role_id: Option<i64>,
    pub role_name: Option<String>,
    pub status: EmployeeStatus,
    pub created_at: Option<String>,
    pub permissions: PermissionDocument,
}

/// Fields written when creating an employee.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub full_name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub department_id: i64,
    pub role_id: i64,
}

/// Fields written when updating an employee. `None` in any optional field
/// keeps the stored value.
#[derive(Debug, Clone)]
pub struct EmployeeChanges {
    pub full_name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub department_id: Option<i64>,
    pub role_id: i64,
    pub status: Option<EmployeeStatus>,
}

/// Fields written when creating or replacing a role.
#[derive(Debug, Clone)]
pub struct RoleFields {
    pub name: String,
    pub department_id: i64,
    pub permissions: PermissionDocument,
}
