//! HTTP surface: one [`Module`] per resource, all mounted under `/api`.

pub mod departments;
pub mod employees;
pub mod roles;
pub mod session;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::openapi::Info;
use crate::router::{Context, Router};
use crate::{Error, Module, Result};

/// Path of the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Every API module, in registration order.
pub fn modules() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(employees::EmployeesModule),
        Box::new(departments::DepartmentsModule),
        Box::new(roles::RolesModule),
        Box::new(session::SessionModule),
    ]
}

/// Router with all modules, the health probe and the OpenAPI document.
pub fn router() -> Router {
    let mut router = Router::new();
    for module in modules() {
        tracing::debug!(module = module.name(), "registering routes");
        module.routes(&mut router);
    }
    router.get("/health", |_ctx| async { Ok(crate::response::text("OK")) });
    router.openapi(
        OPENAPI_PATH,
        Info {
            title: "Roster API",
            version: env!("CARGO_PKG_VERSION"),
        },
    );
    router
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Numeric id that browser forms may also send as a string.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LooseId {
    Number(i64),
    Text(String),
}

impl LooseId {
    fn value(&self) -> Option<i64> {
        match self {
            LooseId::Number(n) => Some(*n),
            LooseId::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// The `{id}` path parameter.
pub(crate) fn id_param(ctx: &Context) -> Result<i64> {
    ctx.require_param("id")?
        .parse()
        .map_err(|_| Error::BadRequest("Invalid id".into()))
}

/// Trimmed, non-empty text field.
pub(crate) fn required_text(
    value: Option<String>,
    field: &'static str,
    message: &str,
) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(Error::validation(field, message)),
    }
}

/// Positive id field. Zero, negative and unparseable values count as missing.
pub(crate) fn required_id(value: Option<LooseId>, field: &'static str, message: &str) -> Result<i64> {
    optional_id(value, field, message)?.ok_or_else(|| Error::validation(field, message))
}

/// Id field that may be omitted, but must be valid when present.
pub(crate) fn optional_id(
    value: Option<LooseId>,
    field: &'static str,
    message: &str,
) -> Result<Option<i64>> {
    match value {
        None => Ok(None),
        Some(LooseId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(id) => match id.value() {
            Some(n) if n > 0 => Ok(Some(n)),
            _ => Err(Error::validation(field, message)),
        },
    }
}

/// Trimmed optional text; blank reads as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
