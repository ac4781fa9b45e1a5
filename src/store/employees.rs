use libsql::{Connection, Row};

use super::{int_or_none, is_unique_violation, text_or_none};
use crate::Error;
use crate::model::{Employee, EmployeeChanges, EmployeeStatus, NewEmployee};
use crate::permission::PermissionDocument;

/// Employee columns plus the role's name and stored permissions. The
/// department is taken from the role, falling back to the employee's own
/// column for rows without one.
const SELECT_EMPLOYEE: &str = "SELECT e.id, e.fullName, e.employeeId, e.email, e.mobile,
        COALESCE(r.departmentId, e.departmentId), COALESCE(rd.name, d.name),
        e.roleId, r.name, e.status, e.created_at, r.permissions
    FROM employees e
    LEFT JOIN roles r ON e.roleId = r.id
    LEFT JOIN department rd ON r.departmentId = rd.id
    LEFT JOIN department d ON e.departmentId = d.id";

fn from_row(row: &Row) -> crate::Result<Employee> {
    let id: i64 = row.get(0)?;
    let raw = text_or_none(row, 11)?;
    let _span = tracing::debug_span!("employee", id).entered();
    Ok(Employee {
        id,
        full_name: row.get(1)?,
        employee_id: row.get(2)?,
        email: row.get(3)?,
        mobile: text_or_none(row, 4)?,
        department_id: int_or_none(row, 5)?,
        department_name: text_or_none(row, 6)?,
        role_id: int_or_none(row, 7)?,
        role_name: text_or_none(row, 8)?,
        status: EmployeeStatus::from_db(text_or_none(row, 9)?.as_deref()),
        created_at: text_or_none(row, 10)?,
        permissions: PermissionDocument::from_json_text(raw.as_deref()),
    })
}

async fn query_one(
    conn: &Connection,
    filter: &str,
    params: impl libsql::params::IntoParams,
) -> crate::Result<Option<Employee>> {
    let sql = format!("{SELECT_EMPLOYEE} WHERE {filter}");
    let mut rows = conn.query(&sql, params).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(from_row(&row)?)),
        None => Ok(None),
    }
}

/// All employees, newest first.
pub async fn list(conn: &Connection) -> crate::Result<Vec<Employee>> {
    let sql = format!("{SELECT_EMPLOYEE} ORDER BY e.created_at DESC, e.id DESC");
    let mut rows = conn.query(&sql, ()).await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(from_row(&row)?);
    }
    Ok(out)
}

pub async fn get(conn: &Connection, id: i64) -> crate::Result<Option<Employee>> {
    query_one(conn, "e.id = ?1", libsql::params![id]).await
}

pub async fn find_by_email(conn: &Connection, email: &str) -> crate::Result<Option<Employee>> {
    query_one(conn, "e.email = ?1", libsql::params![email]).await
}

/// Next `EMP-` number, one past the highest row id.
async fn next_employee_id(conn: &Connection) -> crate::Result<String> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(id), 0) FROM employees", ())
        .await?;
    let max: i64 = match rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };
    Ok(format!("EMP-{}", 1000 + max + 1))
}

fn conflict(e: libsql::Error) -> Error {
    if !is_unique_violation(&e) {
        return Error::Database(e);
    }
    if e.to_string().contains("employees.employeeId") {
        Error::Conflict("Employee ID already exists".into())
    } else {
        Error::Conflict("Email already exists".into())
    }
}

/// Insert an employee. Returns the row id and the generated employee id.
pub async fn create(conn: &Connection, new: &NewEmployee) -> crate::Result<(i64, String)> {
    let employee_id = next_employee_id(conn).await?;
    conn.execute(
        "INSERT INTO employees (fullName, employeeId, email, departmentId, roleId, mobile)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        libsql::params![
            new.full_name.as_str(),
            employee_id.as_str(),
            new.email.as_str(),
            new.department_id,
            new.role_id,
            new.mobile.clone()
        ],
    )
    .await
    .map_err(conflict)?;
    Ok((conn.last_insert_rowid(), employee_id))
}

/// Update an employee. Returns `false` when no such employee exists.
pub async fn update(conn: &Connection, id: i64, changes: &EmployeeChanges) -> crate::Result<bool> {
    let changed = conn
        .execute(
            "UPDATE employees
             SET fullName = ?1, email = ?2, departmentId = COALESCE(?3, departmentId),
                 roleId = ?4, status = COALESCE(?5, status), mobile = COALESCE(?6, mobile)
             WHERE id = ?7",
            libsql::params![
                changes.full_name.as_str(),
                changes.email.as_str(),
                changes.department_id,
                changes.role_id,
                changes.status.map(EmployeeStatus::as_str),
                changes.mobile.clone(),
                id
            ],
        )
        .await
        .map_err(conflict)?;
    Ok(changed > 0)
}
