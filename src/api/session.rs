//! Sign-in for the admin panel.
//!
//! Identity is verified upstream, so login only takes an email. Access is
//! decided from the employee's current role document on every call.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::required_text;
use crate::model::{Employee, EmployeeStatus};
use crate::permission::catalog::CATALOG_VERSION;
use crate::permission::gate;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::store::employees;
use crate::{Error, Module, Result, auth};

pub struct SessionModule;

impl Module for SessionModule {
    fn name(&self) -> &'static str {
        "session"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<Login>();
        router.procedure::<CurrentSession>();
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginInput {
    pub email: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LoginOutput {
    pub message: String,
    pub user: Employee,
    pub token: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    pub user: Employee,
    /// Admin capability id to whether it is granted.
    pub capabilities: BTreeMap<String, bool>,
    /// Revision of the permission catalog the capabilities refer to.
    pub catalog_version: u32,
}

/// Refuse employees that may not use the admin panel.
fn admit(employee: &Employee) -> Result<()> {
    if employee.status != EmployeeStatus::Active {
        return Err(Error::Forbidden("Account is inactive".into()));
    }
    if !gate::is_admin_panel_user(&employee.permissions) {
        return Err(Error::Forbidden("Admin Panel permission required".into()));
    }
    Ok(())
}

pub struct Login;

impl Procedure for Login {
    fn meta() -> Meta {
        Meta::post("/api/login")
            .summary("Sign in to the admin panel")
            .tag("session")
    }

    type Input = LoginInput;
    type Output = LoginOutput;

    async fn handle(ctx: Context, input: LoginInput) -> Result<LoginOutput> {
        let email = required_text(input.email, "email", "Email is required")?;
        let employee = employees::find_by_email(ctx.require_db()?, &email)
            .await?
            .ok_or_else(|| Error::NotFound("Employee".into()))?;

        if let Err(e) = admit(&employee) {
            tracing::info!(id = employee.id, reason = %e, "login refused");
            return Err(e);
        }

        let token = auth::create_token(&ctx.config.auth, employee.id)?;
        tracing::info!(id = employee.id, "login");
        Ok(LoginOutput {
            message: "Login successful".into(),
            user: employee,
            token,
        })
    }
}

pub struct CurrentSession;

impl Procedure for CurrentSession {
    fn meta() -> Meta {
        Meta::get("/api/session")
            .summary("Signed-in employee and admin capabilities")
            .tag("session")
            .authenticated()
    }

    type Input = Empty;
    type Output = SessionOutput;

    async fn handle(ctx: Context, _input: Empty) -> Result<SessionOutput> {
        let id = ctx.require_employee_id()?;
        let employee = employees::get(ctx.require_db()?, id)
            .await?
            .ok_or(Error::Unauthorized)?;
        admit(&employee)?;

        Ok(SessionOutput {
            capabilities: gate::capabilities(&employee.permissions),
            catalog_version: CATALOG_VERSION,
            user: employee,
        })
    }
}
