//! Normalization of stored permission values into [`PartialDocument`]s.
//!
//! Roles written by older releases hold other shapes than the current nested
//! document:
//!
//! - a flag map `{ "crm": true, "missionControl": false, "admin": true }`,
//!   also seen with the old employee column names `crmAccess` and `adminPanel`
//!   (booleans or `0`/`1`)
//! - a JSON string containing the document (double encoded)
//! - `null` or nothing at all
//!
//! Each group is normalized independently, so a document may mix legacy flags
//! and structured groups.

use serde_json::{Map, Value};

use super::{Group, PartialDocument, PartialGrant, PartialGroup};

/// Why a stored value could not be normalized.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("expected a permission object, found {0}")]
    Unsupported(&'static str),

    #[error("embedded permission text is not JSON: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("permission value is encoded more than twice")]
    NestedEncoding,

    #[error("invalid `{group}` group: {reason}")]
    Group { group: &'static str, reason: String },
}

/// Keys accepted for each group, in precedence order.
const CRM_KEYS: &[&str] = &["crm", "crmAccess"];
const MISSION_CONTROL_KEYS: &[&str] = &["missionControl"];
const ADMIN_PANEL_KEYS: &[&str] = &["adminPanel", "admin"];

/// Normalize a stored or submitted permission value.
pub fn normalize(raw: &Value) -> Result<PartialDocument, NormalizeError> {
    normalize_at(raw, false)
}

fn normalize_at(raw: &Value, decoded: bool) -> Result<PartialDocument, NormalizeError> {
    match raw {
        Value::Null => Ok(PartialDocument::default()),
        Value::String(_) if decoded => Err(NormalizeError::NestedEncoding),
        Value::String(text) => {
            let inner: Value = serde_json::from_str(text)?;
            normalize_at(&inner, true)
        }
        Value::Object(map) => Ok(PartialDocument {
            crm: group(map, Group::Crm, CRM_KEYS)?,
            mission_control: group(map, Group::MissionControl, MISSION_CONTROL_KEYS)?,
            admin_panel: group(map, Group::AdminPanel, ADMIN_PANEL_KEYS)?,
        }),
        other => Err(NormalizeError::Unsupported(kind(other))),
    }
}

fn group(
    map: &Map<String, Value>,
    group: Group,
    keys: &[&str],
) -> Result<Option<PartialGroup>, NormalizeError> {
    let Some(value) = keys
        .iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
    else {
        return Ok(None);
    };

    if let Some(flag) = as_flag(value) {
        // Legacy flag: the catalog supplies every sub-grant, all off.
        return Ok(Some(PartialGroup {
            enabled: Some(flag),
            grants: None,
        }));
    }

    let Value::Object(obj) = value else {
        return Err(invalid(group, format!("expected object or flag, found {}", kind(value))));
    };

    let enabled = match obj.get("enabled") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            as_flag(v).ok_or_else(|| invalid(group, format!("`enabled` is {}", kind(v))))?,
        ),
    };

    let grants = match obj.get(list_key(group)) {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| {
                    serde_json::from_value::<PartialGrant>(item.clone())
                        .map_err(|e| invalid(group, e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(other) => {
            return Err(invalid(
                group,
                format!("`{}` is {}", list_key(group), kind(other)),
            ));
        }
    };

    Ok(Some(PartialGroup { enabled, grants }))
}

fn list_key(group: Group) -> &'static str {
    match group {
        Group::Crm => "modules",
        Group::MissionControl => "stages",
        Group::AdminPanel => "configs",
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().filter(|n| *n == 0 || *n == 1).map(|n| n == 1),
        _ => None,
    }
}

fn invalid(group: Group, reason: String) -> NormalizeError {
    NormalizeError::Group {
        group: group.key(),
        reason,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
