use libsql::{Connection, Row};

use super::{int_or_none, text_or_none};
use crate::model::{Role, RoleFields};
use crate::permission::PermissionDocument;

const SELECT_ROLE: &str = "SELECT r.id, r.name, r.departmentId, d.name, r.permissions, r.created_at,
        (SELECT COUNT(*) FROM employees e WHERE e.roleId = r.id)
    FROM roles r
    LEFT JOIN department d ON r.departmentId = d.id";

fn from_row(row: &Row) -> crate::Result<Role> {
    let id: i64 = row.get(0)?;
    let raw = text_or_none(row, 4)?;
    let _span = tracing::debug_span!("role", id).entered();
    Ok(Role {
        id,
        name: row.get(1)?,
        department_id: int_or_none(row, 2)?,
        department_name: text_or_none(row, 3)?,
        permissions: PermissionDocument::from_json_text(raw.as_deref()),
        created_at: text_or_none(row, 5)?,
        employee_count: row.get(6)?,
    })
}

/// All roles with their employee counts, newest first.
pub async fn list(conn: &Connection) -> crate::Result<Vec<Role>> {
    let sql = format!("{SELECT_ROLE} ORDER BY r.created_at DESC, r.id DESC");
    let mut rows = conn.query(&sql, ()).await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(from_row(&row)?);
    }
    Ok(out)
}

pub async fn get(conn: &Connection, id: i64) -> crate::Result<Option<Role>> {
    let sql = format!("{SELECT_ROLE} WHERE r.id = ?1");
    let mut rows = conn.query(&sql, libsql::params![id]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(from_row(&row)?)),
        None => Ok(None),
    }
}

pub async fn exists(conn: &Connection, id: i64) -> crate::Result<bool> {
    let mut rows = conn
        .query("SELECT 1 FROM roles WHERE id = ?1", libsql::params![id])
        .await?;
    Ok(rows.next().await?.is_some())
}

/// Insert a role and return its id.
pub async fn create(conn: &Connection, fields: &RoleFields) -> crate::Result<i64> {
    conn.execute(
        "INSERT INTO roles (name, departmentId, permissions) VALUES (?1, ?2, ?3)",
        libsql::params![
            fields.name.as_str(),
            fields.department_id,
            fields.permissions.to_json_text()
        ],
    )
    .await?;
    Ok(conn.last_insert_rowid())
}

/// Replace a role's fields. Returns `false` when no such role exists.
pub async fn update(conn: &Connection, id: i64, fields: &RoleFields) -> crate::Result<bool> {
    let changed = conn
        .execute(
            "UPDATE roles SET name = ?1, departmentId = ?2, permissions = ?3 WHERE id = ?4",
            libsql::params![
                fields.name.as_str(),
                fields.department_id,
                fields.permissions.to_json_text(),
                id
            ],
        )
        .await?;
    Ok(changed > 0)
}
