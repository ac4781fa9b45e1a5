//! Employee records.
//!
//! Employees inherit their permissions from their role; nothing here writes a
//! permission document.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    LooseId, Message, id_param, optional_id, optional_text, required_id, required_text,
};
use crate::mail;
use crate::model::{Employee, EmployeeChanges, EmployeeStatus, NewEmployee};
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::store::{departments, employees, roles};
use crate::{Error, Module, Result};

pub struct EmployeesModule;

impl Module for EmployeesModule {
    fn name(&self) -> &'static str {
        "employees"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<ListEmployees>();
        router.procedure::<GetEmployee>();
        router.procedure::<CreateEmployee>();
        router.procedure::<UpdateEmployee>();
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub department_id: Option<LooseId>,
    pub role_id: Option<LooseId>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreated {
    pub message: String,
    pub id: i64,
    pub employee_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub department_id: Option<LooseId>,
    pub role_id: Option<LooseId>,
    pub status: Option<EmployeeStatus>,
}

fn email(value: Option<String>) -> Result<String> {
    let email = required_text(value, "email", "Email is required")?;
    if !email.contains('@') {
        return Err(Error::validation("email", "Email is invalid"));
    }
    Ok(email)
}

async fn check_references(
    ctx: &Context,
    department_id: Option<i64>,
    role_id: i64,
) -> Result<()> {
    let conn = ctx.require_db()?;
    if let Some(id) = department_id
        && !departments::exists(conn, id).await?
    {
        return Err(Error::validation("departmentId", "Department does not exist"));
    }
    if !roles::exists(conn, role_id).await? {
        return Err(Error::validation("roleId", "Role does not exist"));
    }
    Ok(())
}

pub struct ListEmployees;

impl Procedure for ListEmployees {
    fn meta() -> Meta {
        Meta::get("/api/employees")
            .summary("List employees, newest first")
            .tag("employees")
    }

    type Input = Empty;
    type Output = Vec<Employee>;

    async fn handle(ctx: Context, _input: Empty) -> Result<Vec<Employee>> {
        employees::list(ctx.require_db()?).await
    }
}

pub struct GetEmployee;

impl Procedure for GetEmployee {
    fn meta() -> Meta {
        Meta::get("/api/employees/{id}")
            .summary("Get an employee")
            .tag("employees")
    }

    type Input = Empty;
    type Output = Employee;

    async fn handle(ctx: Context, _input: Empty) -> Result<Employee> {
        let id = id_param(&ctx)?;
        employees::get(ctx.require_db()?, id)
            .await?
            .ok_or_else(|| Error::NotFound("Employee".into()))
    }
}

pub struct CreateEmployee;

impl Procedure for CreateEmployee {
    fn meta() -> Meta {
        Meta::post("/api/employees")
            .summary("Create an employee and send a welcome notification")
            .tag("employees")
            .status(201)
    }

    type Input = CreateEmployeeInput;
    type Output = EmployeeCreated;

    async fn handle(ctx: Context, input: CreateEmployeeInput) -> Result<EmployeeCreated> {
        let new = NewEmployee {
            full_name: required_text(input.full_name, "fullName", "Full name is required")?,
            email: email(input.email)?,
            mobile: optional_text(input.mobile),
            department_id: required_id(
                input.department_id,
                "departmentId",
                "Department is required",
            )?,
            role_id: required_id(input.role_id, "roleId", "Role is required")?,
        };
        check_references(&ctx, Some(new.department_id), new.role_id).await?;

        let conn = ctx.require_db()?;
        let (id, employee_id) = employees::create(conn, &new).await?;
        tracing::info!(id, employee_id = %employee_id, "employee created");

        match employees::get(conn, id).await {
            Ok(Some(employee)) => {
                let welcome = mail::welcome(&employee, &ctx.config.mail.organization);
                mail::dispatch(ctx.mailer.clone(), welcome);
            }
            Ok(None) => tracing::warn!(id, "created employee not found, no welcome sent"),
            Err(e) => tracing::warn!(id, error = %e, "could not load employee for welcome"),
        }

        Ok(EmployeeCreated {
            message: "Employee created successfully".into(),
            id,
            employee_id,
        })
    }
}

pub struct UpdateEmployee;

impl Procedure for UpdateEmployee {
    fn meta() -> Meta {
        Meta::put("/api/employees/{id}")
            .summary("Update an employee")
            .tag("employees")
    }

    type Input = UpdateEmployeeInput;
    type Output = Message;

    async fn handle(ctx: Context, input: UpdateEmployeeInput) -> Result<Message> {
        let id = id_param(&ctx)?;
        let changes = EmployeeChanges {
            full_name: required_text(input.full_name, "fullName", "Full name is required")?,
            email: email(input.email)?,
            mobile: optional_text(input.mobile),
            department_id: optional_id(
                input.department_id,
                "departmentId",
                "Department is invalid",
            )?,
            role_id: required_id(input.role_id, "roleId", "Role is required")?,
            status: input.status,
        };
        check_references(&ctx, changes.department_id, changes.role_id).await?;

        if !employees::update(ctx.require_db()?, id, &changes).await? {
            return Err(Error::NotFound("Employee".into()));
        }
        tracing::info!(id, "employee updated");
        Ok(Message::new("Employee updated successfully"))
    }
}
