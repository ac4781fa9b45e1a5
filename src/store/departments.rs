use libsql::Connection;

use crate::model::Department;

/// All departments, ordered by name.
pub async fn list(conn: &Connection) -> crate::Result<Vec<Department>> {
    let mut rows = conn
        .query("SELECT id, name FROM department ORDER BY name ASC", ())
        .await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(Department {
            id: row.get(0)?,
            name: row.get(1)?,
        });
    }
    Ok(out)
}

pub async fn exists(conn: &Connection, id: i64) -> crate::Result<bool> {
    let mut rows = conn
        .query("SELECT 1 FROM department WHERE id = ?1", libsql::params![id])
        .await?;
    Ok(rows.next().await?.is_some())
}
