//! SQL access per entity.
//!
//! Every function takes the request's connection explicitly and issues
//! single statements. Unique-constraint violations surface as
//! [`Error::Conflict`](crate::Error::Conflict); everything else propagates as
//! a database error.

pub mod departments;
pub mod employees;
pub mod roles;

use libsql::{Row, Value};

/// Text column that may hold NULL or, in legacy rows, a non-text value.
pub(crate) fn text_or_none(row: &Row, idx: i32) -> crate::Result<Option<String>> {
    Ok(match row.get_value(idx)? {
        Value::Null => None,
        Value::Text(s) => Some(s),
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    })
}

/// Integer column that may be NULL.
pub(crate) fn int_or_none(row: &Row, idx: i32) -> crate::Result<Option<i64>> {
    Ok(match row.get_value(idx)? {
        Value::Integer(i) => Some(i),
        _ => None,
    })
}

/// Whether the store rejected a write on a UNIQUE constraint.
pub(crate) fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}
